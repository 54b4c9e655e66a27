mod ring_offset;

pub use ring_offset::RingOffset;
