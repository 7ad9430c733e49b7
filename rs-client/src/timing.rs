use std::time::Instant;

/// Wall-clock timer for one tick; reads 0 with `perf_timing` off.
#[derive(Clone, Copy, Debug)]
pub struct Timing(Option<Instant>);

impl Timing {
    #[inline]
    pub fn start() -> Self {
        #[cfg(feature = "perf_timing")]
        {
            Self(Some(Instant::now()))
        }
        #[cfg(not(feature = "perf_timing"))]
        {
            Self(None)
        }
    }

    #[inline]
    pub fn ms(&self) -> f32 {
        self.0
            .map(|t| t.elapsed().as_secs_f32() * 1000.0)
            .unwrap_or(0.0)
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct TickCost {
    pub samples: u64,
    pub total_ms: f32,
    pub max_ms: f32,
}

impl TickCost {
    pub fn record(&mut self, ms: f32) {
        self.samples += 1;
        self.total_ms += ms;
        self.max_ms = self.max_ms.max(ms);
    }

    pub fn mean_ms(&self) -> f32 {
        if self.samples == 0 {
            0.0
        } else {
            self.total_ms / self.samples as f32
        }
    }
}
