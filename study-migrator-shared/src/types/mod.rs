mod chunk_registry;
mod device_settings;
mod entity;
pub mod extended_json;
mod participant;
mod researcher;
mod study;
mod survey;

pub use chunk_registry::{DataType, NewChunkRegistry, SourceChunk};
pub use device_settings::{DeviceSettingsFields, NewDeviceSettings, SourceDeviceSettings};
pub use entity::{EntityKind, PrimaryKey, Record, UniqueKey};
pub use extended_json::ObjectId;
pub use participant::{NewParticipant, OsType, SourceUser};
pub use researcher::{NewResearcher, SourceAdmin, StudyResearcher};
pub use study::{NewStudy, SourceStudy, StudyKey};
pub use survey::{NewSurvey, SourceSurvey, SurveyType};
