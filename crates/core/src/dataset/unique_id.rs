/// Endless run of image identifiers: a random 32-bit start, then +1 per item.
///
/// Identifiers never repeat within one sequence. Two runs may overlap; only
/// uniqueness inside a run is guaranteed.
#[derive(Clone, Debug)]
pub struct UniqueIdSequence {
    next: u64,
}

impl UniqueIdSequence {
    pub fn new() -> Self {
        Self::with_seed(rand::random::<u32>() as u64)
    }

    pub fn with_seed(seed: u64) -> Self {
        Self { next: seed }
    }

    pub fn next_id(&mut self) -> u64 {
        let id = self.next;
        self.next += 1;
        id
    }
}

impl Default for UniqueIdSequence {
    fn default() -> Self {
        Self::new()
    }
}

impl Iterator for UniqueIdSequence {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        Some(self.next_id())
    }
}
