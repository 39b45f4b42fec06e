//! Locating the step the host engine is executing.
//!
//! The engine does not hand the current step to listeners, so it is read
//! from the execution stack: the innermost frame owned by the engine's
//! per-step entry point holds it. That entry point was renamed in engine
//! 4.0, hence one probe per engine generation.

use semver::Version;

use crate::host::{ExecutionFrame, Step};

/// Per-step entry point of engines before 4.0.
pub const RUN_STEPS_FRAME: &str = "run_steps";

/// Per-step entry point from engine 4.0.
pub const RUN_FRAME: &str = "run";

/// First engine version using [`RUN_FRAME`].
pub const RUN_FRAME_SINCE: Version = Version::new(4, 0, 0);

/// Runner and step found on the stack.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeHit {
    pub runner: Option<String>,
    pub step: Step,
}

pub trait ExecutionProbe {
    /// Function name of the frame holding the current step.
    fn entry_point(&self) -> &'static str;

    /// Walk `frames` (outermost first) from the innermost frame and return
    /// the first matching frame that has a step.
    fn locate(&self, frames: &[ExecutionFrame]) -> Option<ProbeHit> {
        frames
            .iter()
            .rev()
            .filter(|frame| frame.function == self.entry_point())
            .find_map(|frame| {
                frame.step.clone().map(|step| ProbeHit {
                    runner: frame.runner.clone(),
                    step,
                })
            })
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RunStepsProbe;

impl ExecutionProbe for RunStepsProbe {
    fn entry_point(&self) -> &'static str {
        RUN_STEPS_FRAME
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RunProbe;

impl ExecutionProbe for RunProbe {
    fn entry_point(&self) -> &'static str {
        RUN_FRAME
    }
}

/// The probe matching the engine `version`.
pub fn probe_for(version: &Version) -> Box<dyn ExecutionProbe> {
    if *version >= RUN_FRAME_SINCE {
        Box::new(RunProbe)
    } else {
        Box::new(RunStepsProbe)
    }
}
