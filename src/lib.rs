pub mod catalog;
pub mod emit;
pub mod generator;
pub mod lanes;
pub mod model;
pub mod record;

pub use catalog::{Form, Kind, OpDesc, Opcode, CATALOG, FORMS};
pub use generator::{GenConfig, GenError, Generator, TestCase, TestMatrix};
pub use lanes::{Mask, Vector, VECTOR_WIDTH};
pub use record::{emit_matrix, RecordSink, TestRecord};
