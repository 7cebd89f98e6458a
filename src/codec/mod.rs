pub mod wire;
pub mod bit_buffer;
pub mod bit_serializer;
pub mod string;
pub mod flex_serializer;
pub mod encoder;
pub mod decoder;

pub use bit_buffer::{BitBuffer, Mode};
pub use bit_serializer::BitSerializer;
pub use flex_serializer::FlexSerializer;
pub use encoder::encode;
pub use decoder::decode;
