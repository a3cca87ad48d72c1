#![forbid(unsafe_code)]

use soundword_engines::plan::TrialPlan;
use soundword_engines::response_device::InputEventSource;
use soundword_kernel_contracts::session::{ScreenTexts, Session};
use soundword_storage::{RecorderDisposition, RecorderError, SessionRecorder};
use tracing::{info, warn};

use crate::collaborators::{
    AudioPlayback, Collaborators, Pacer, Presenter, ScreenKind, ScreenOutcome,
};
use crate::trial_executor::TrialExecutor;
use crate::ExecutionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    Completed { trials: usize },
    /// Quit at an acknowledgment screen; later blocks were not run.
    Quit {
        trials_completed: usize,
        blocks_completed: usize,
    },
}

/// Runs a whole session: instructions, every block in order, a break screen between blocks.
pub struct Experiment<R, D, A, P, I>
where
    R: SessionRecorder,
    D: Presenter,
    A: AudioPlayback,
    P: Pacer,
    I: InputEventSource,
{
    session: Session,
    plan: TrialPlan,
    executor: TrialExecutor,
    texts: ScreenTexts,
    io: Collaborators<D, A, P, I>,
    recorder: R,
}

impl<R, D, A, P, I> Experiment<R, D, A, P, I>
where
    R: SessionRecorder,
    D: Presenter,
    A: AudioPlayback,
    P: Pacer,
    I: InputEventSource,
{
    pub fn new(
        session: Session,
        plan: TrialPlan,
        executor: TrialExecutor,
        texts: ScreenTexts,
        io: Collaborators<D, A, P, I>,
        recorder: R,
    ) -> Self {
        Self {
            session,
            plan,
            executor,
            texts,
            io,
            recorder,
        }
    }

    pub fn plan(&self) -> &TrialPlan {
        &self.plan
    }

    pub fn recorder(&self) -> &R {
        &self.recorder
    }

    pub fn into_parts(self) -> (R, Collaborators<D, A, P, I>) {
        (self.recorder, self.io)
    }

    /// Runs until every block is done or a quit is acknowledged.
    ///
    /// Quit is only observed at the instruction and break screens.
    pub fn run(&mut self) -> Result<SessionOutcome, ExecutionError> {
        let digest = self.plan.digest();
        info!(
            subj_id = self.session.subj_id.as_str(),
            seed = self.session.seed,
            plan_digest = digest.as_str(),
            device = ?self.executor.device().kind(),
            "session start"
        );

        let outcome = self.io.presenter.show_screen(
            ScreenKind::Instructions,
            &self.texts.title,
            &self.texts.instructions,
        )?;
        if outcome == ScreenOutcome::Quit {
            info!("quit at instructions");
            return Ok(SessionOutcome::Quit {
                trials_completed: 0,
                blocks_completed: 0,
            });
        }

        let block_count = self.plan.block_count();
        let mut trials_completed = 0usize;
        for (n, block) in self.plan.blocks().enumerate() {
            info!(block_ix = block.block_ix().0, trials = block.len(), "block start");
            for trial in block.trials() {
                let run = self.executor.run_trial(trial.clone(), &mut self.io)?;
                self.recorder.append(&run.completed)?;
                trials_completed += 1;
            }
            let blocks_completed = n + 1;
            info!(block_ix = block.block_ix().0, "block done");

            if blocks_completed < block_count {
                let outcome = self.io.presenter.show_screen(
                    ScreenKind::Break,
                    &self.texts.title,
                    &self.texts.break_text,
                )?;
                if outcome == ScreenOutcome::Quit {
                    info!(trials_completed, blocks_completed, "quit at break");
                    return Ok(SessionOutcome::Quit {
                        trials_completed,
                        blocks_completed,
                    });
                }
            }
        }

        info!(trials = trials_completed, "session complete");
        Ok(SessionOutcome::Completed {
            trials: trials_completed,
        })
    }
}

/// Closes the recorder: kept after a full run, removed after a quit that left only the header.
pub fn finish_session<R: SessionRecorder>(
    recorder: &mut R,
    outcome: SessionOutcome,
) -> Result<RecorderDisposition, ExecutionError> {
    let disposition = match outcome {
        SessionOutcome::Completed { .. } => recorder.close()?,
        SessionOutcome::Quit { .. } => recorder.discard_if_header_only()?,
    };
    Ok(disposition)
}

/// Closes the recorder after a run that ended in an error. Rows already written are kept.
///
/// A close failure is logged and handed back; it never replaces the error that ended the run.
pub fn close_after_failure<R: SessionRecorder>(recorder: &mut R) -> Option<RecorderError> {
    let err = recorder.close().err()?;
    warn!(error = %err, rows = recorder.rows_written(), "closing output after failure");
    Some(err)
}
