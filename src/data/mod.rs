pub mod model_file;
pub mod model_outputs;
pub mod topology;
pub mod training_data;

pub use model_file::{parse_model_file, read_model_file, to_model_file, write_model_file};
pub use model_outputs::{ModelOutputs, OutputWeight};
pub use topology::{Interaction, Topology};
pub use training_data::{Condition, NodeResponse, Observation, Response, TrainingData, GLOBAL_OUTPUT};
