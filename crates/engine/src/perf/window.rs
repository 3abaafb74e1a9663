pub const DEFAULT_WINDOW_CAPACITY: usize = 60;

/// Fixed-capacity ring of samples. Once full, every push evicts the oldest value.
#[derive(Debug, Clone)]
pub struct RollingWindow {
    samples: Box<[f32]>,
    head: usize,
    count: usize,
}

impl Default for RollingWindow {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_WINDOW_CAPACITY)
    }
}

impl RollingWindow {
    /// A zero capacity is bumped to one so the window can always hold the latest sample.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            samples: vec![0.0; capacity.max(1)].into_boxed_slice(),
            head: 0,
            count: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.samples.len()
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn is_full(&self) -> bool {
        self.count == self.capacity()
    }

    pub fn push(&mut self, value: f32) {
        let capacity = self.capacity();
        self.samples[self.head] = value;
        self.head = (self.head + 1) % capacity;
        if self.count < capacity {
            self.count += 1;
        }
    }

    pub fn last(&self) -> Option<f32> {
        if self.count == 0 {
            return None;
        }
        let capacity = self.capacity();
        Some(self.samples[(self.head + capacity - 1) % capacity])
    }

    /// Oldest sample first.
    pub fn iter(&self) -> impl Iterator<Item = f32> + '_ {
        let capacity = self.capacity();
        let start = (self.head + capacity - self.count) % capacity;
        (0..self.count).map(move |offset| self.samples[(start + offset) % capacity])
    }

    pub fn to_vec(&self) -> Vec<f32> {
        self.iter().collect()
    }

    pub fn clear(&mut self) {
        self.head = 0;
        self.count = 0;
    }

    pub fn summary(&self) -> Option<WindowSummary> {
        if self.count == 0 {
            return None;
        }

        let mut sum = 0.0f32;
        let mut min = f32::INFINITY;
        let mut max = f32::NEG_INFINITY;
        for value in self.iter() {
            sum += value;
            min = min.min(value);
            max = max.max(value);
        }
        let mean = sum / self.count as f32;

        let variance = if self.count < 2 {
            0.0
        } else {
            self.iter()
                .map(|value| {
                    let delta = value - mean;
                    delta * delta
                })
                .sum::<f32>()
                / self.count as f32
        };

        Some(WindowSummary {
            mean,
            min,
            max,
            variance,
        })
    }
}

/// Aggregates over the samples currently held by a [`RollingWindow`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowSummary {
    pub mean: f32,
    pub min: f32,
    pub max: f32,
    /// Population variance; zero below two samples.
    pub variance: f32,
}
