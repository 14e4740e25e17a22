mod payload;
pub use payload::PayloadFormatter;
