pub mod ids;
pub mod series;
pub mod table;
pub mod threshold;

pub use ids::{MaterialId, ModelId};
pub use series::HullDistanceSeries;
pub use table::ModelPredictionTable;
pub use threshold::StabilityThreshold;
