// Card extraction: one rendered listing card in, one RfqRecord out.

pub mod rfq_parser;

pub use rfq_parser::{Parser, RfqParser};
