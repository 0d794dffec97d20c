//! Plain types shared by the store interfaces.
use std::fmt;

/// The collections of the legacy document store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Studies,
    Surveys,
    DeviceSettings,
    Admins,
    Users,
    ChunkRegistries,
}

impl Collection {
    pub const ALL: [Collection; 6] = [
        Collection::Studies,
        Collection::Surveys,
        Collection::DeviceSettings,
        Collection::Admins,
        Collection::Users,
        Collection::ChunkRegistries,
    ];

    /// Collection name, which is also the stem of its export file.
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Studies => "studies",
            Collection::Surveys => "surveys",
            Collection::DeviceSettings => "device_settings",
            Collection::Admins => "admins",
            Collection::Users => "users",
            Collection::ChunkRegistries => "chunk_registries",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Row counts of the destination tables, printed before and after a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableCounts {
    pub studies: u64,
    pub surveys: u64,
    pub device_settings: u64,
    pub researchers: u64,
    pub participants: u64,
    pub chunk_registries: u64,
}

impl fmt::Display for TableCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "studies={} surveys={} device_settings={} researchers={} participants={} chunk_registries={}",
            self.studies,
            self.surveys,
            self.device_settings,
            self.researchers,
            self.participants,
            self.chunk_registries
        )
    }
}
