/// What one world task did. Counts cover only data that reached the output.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WorldReport {
    pub name: String,
    pub chunks: u64,
    pub block_records: u64,
    pub entities: u64,
    /// Records whose coordinates could not be rewritten.
    pub skipped_records: u64,
    pub failure: Option<String>,
}

impl WorldReport {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn succeeded(&self) -> bool {
        self.failure.is_none()
    }
}

#[derive(Clone, Debug, Default)]
pub struct MergeReport {
    /// In placement order.
    pub worlds: Vec<WorldReport>,
}

impl MergeReport {
    pub fn world(&self, name: &str) -> Option<&WorldReport> {
        self.worlds.iter().find(|w| w.name == name)
    }

    pub fn chunks(&self) -> u64 {
        self.worlds.iter().map(|w| w.chunks).sum()
    }

    pub fn skipped_records(&self) -> u64 {
        self.worlds.iter().map(|w| w.skipped_records).sum()
    }

    pub fn failed(&self) -> impl Iterator<Item = &WorldReport> {
        self.worlds.iter().filter(|w| !w.succeeded())
    }
}
