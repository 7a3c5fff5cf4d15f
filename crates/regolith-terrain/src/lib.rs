//! Deterministic terrain generation and chunk streaming.
//!
//! Generation is a pure function of `(world_seed, chunk_id)`: each chunk
//! derives its own RNG seed from the world seed, so chunks can be generated
//! in any order (or regenerated after eviction) with identical results.
//! Transcendental math goes through `libm` so the output is bit-exact across
//! platforms.

pub mod generator;
pub mod streaming;

pub use generator::{
    BASE_HEIGHT, DEFAULT_CHUNK_HEIGHT, DEFAULT_CHUNK_RADIUS, DEFAULT_CHUNK_SIZE, GeneratedChunk,
    VARIATION, create_empty_world, derive_chunk_seed, generate_chunk,
};
pub use streaming::{GeneratedWorld, StreamingUpdate, ensure_chunks_for_position, generate_world};
