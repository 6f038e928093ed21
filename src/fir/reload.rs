use std::sync::Arc;

use log::debug;

use crate::arith::Element;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReloadPhase {
    #[default]
    Steady,
    Swapping,
}

/// Coefficient vector forwarded downstream together with the trigger
pub type ReloadToken<C> = Arc<[C]>;

/// Shadow of the last applied coefficients
///
/// Stage 0 compares supplied vectors against the shadow; later stages
/// follow the token forwarded on the cascade link. A change puts the stage
/// into `Swapping` for exactly one call.
#[derive(Debug, Clone)]
pub struct ReloadState<C> {
    phase: ReloadPhase,
    shadow: Option<Vec<C>>,
}

impl<C: Element> ReloadState<C> {
    /// Start from `initial` coefficients, or from none so that the first
    /// supplied vector always counts as a change
    pub fn new(initial: Option<&[C]>) -> Self {
        Self {
            phase: ReloadPhase::Steady,
            shadow: initial.map(<[C]>::to_vec),
        }
    }

    pub fn phase(&self) -> ReloadPhase {
        self.phase
    }

    /// Stage 0: compare `supplied` with the shadow
    ///
    /// Returns the token to forward when the coefficients changed.
    pub fn compare(&mut self, stage: usize, supplied: &[C]) -> Option<ReloadToken<C>> {
        let changed = self.shadow.as_deref() != Some(supplied);
        self.transition(stage, changed.then(|| Arc::from(supplied)))
    }

    /// Later stages: act on the token received from upstream
    pub fn follow(
        &mut self,
        stage: usize,
        token: Option<ReloadToken<C>>,
    ) -> Option<ReloadToken<C>> {
        self.transition(stage, token)
    }

    fn transition(
        &mut self,
        stage: usize,
        token: Option<ReloadToken<C>>,
    ) -> Option<ReloadToken<C>> {
        match token {
            Some(coeffs) => {
                if self.phase == ReloadPhase::Swapping {
                    debug!("stage {}: back-to-back coefficient change", stage);
                }
                self.phase = ReloadPhase::Swapping;
                self.shadow = Some(coeffs.to_vec());
                debug!(
                    "stage {}: swapping to {} new coefficients",
                    stage,
                    coeffs.len()
                );
                Some(coeffs)
            }
            None => {
                self.phase = ReloadPhase::Steady;
                None
            }
        }
    }
}
