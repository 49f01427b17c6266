use std::sync::Arc;
use std::time::Duration;

pub mod json_handler;

#[derive(Debug, Clone)]
pub enum Event {
    RunStarted {
        input_file: String,
        output_file: String,
        resolution: String,
        duration: String,
        frame_rate: String,
        detector: String,
        update_freq: u32,
    },

    // Decode + detection pass
    DetectionProgress {
        frames_read: u64,
        estimated_frames: u64,
    },

    DetectionComplete {
        frames_read: u64,
        samples: usize,
        total_regions: usize,
        coverage: f64, // mean fraction of the frame inside a region
    },

    PlanReady {
        chunks: usize,
        region_directives: usize,
        quality_offset: f64,
    },

    // Encode pass
    EncodingStarted {
        total_duration_s: f64,
    },

    EncodingProgress {
        elapsed_s: f64,
        total_s: f64,
        percent: f32,
        speed: f32,
        fps: f32,
    },

    RunComplete {
        output_file: String,
        input_size: u64,
        output_size: Option<u64>,
        total_time: Duration,
    },

    Warning {
        message: String,
    },
}

pub trait EventHandler: Send + Sync {
    fn handle(&self, event: &Event);
}

pub struct EventDispatcher {
    handlers: Vec<Arc<dyn EventHandler>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    pub fn add_handler(&mut self, handler: Arc<dyn EventHandler>) {
        self.handlers.push(handler);
    }

    pub fn emit(&self, event: Event) {
        for handler in &self.handlers {
            handler.handle(&event);
        }
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Collector(Mutex<Vec<String>>);

    impl EventHandler for Collector {
        fn handle(&self, event: &Event) {
            if let Ok(mut seen) = self.0.lock() {
                seen.push(format!("{event:?}"));
            }
        }
    }

    #[test]
    fn test_dispatcher_fans_out_to_every_handler() {
        let a = Arc::new(Collector::default());
        let b = Arc::new(Collector::default());
        let mut dispatcher = EventDispatcher::new();
        dispatcher.add_handler(a.clone());
        dispatcher.add_handler(b.clone());

        dispatcher.emit(Event::Warning {
            message: "odd".to_string(),
        });

        assert_eq!(a.0.lock().unwrap().len(), 1);
        assert_eq!(b.0.lock().unwrap().len(), 1);
    }
}
