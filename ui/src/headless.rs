use log::info;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use turret_backend::Display;

use crate::CameraLoop;

/// No window; Ctrl-C is the stop request.
pub(crate) struct Headless {
    stop: Arc<AtomicBool>,
}

impl Headless {
    pub(crate) fn install() -> crate::Result<Self> {
        let stop = Arc::new(AtomicBool::new(false));
        let flag = stop.clone();
        ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst))?;

        Ok(Self { stop })
    }
}

impl<F> Display<F> for Headless {
    fn show(&mut self, _frame: &F) -> turret_backend::Result<()> {
        Ok(())
    }

    fn stop_requested(&mut self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }
}

pub(crate) fn run(mut tracking: CameraLoop) -> crate::Result<()> {
    let mut display = Headless::install()?;
    info!("running headless, press Ctrl-C to stop");
    let reason = tracking.run(&mut display);
    info!("tracking stopped: {reason:?}");

    Ok(())
}
