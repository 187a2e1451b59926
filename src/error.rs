use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Bad filter matrices or an ill-conditioned snapshot transition
    /// will cause the algebraic calculations to wind up here.
    #[error("failed to invert matrix")]
    MatrixInversion,

    /// A delayed measurement walked past the snapshot ring: the caller
    /// must discard it.
    #[error("delayed measurement is older than the retained snapshots")]
    DelayedMeasurementTooOld,

    /// Every row of a measurement epoch was excluded (no range entry,
    /// elevation mask, zero weight): the update is skipped entirely.
    #[error("no usable measurement rows")]
    EmptyMeasurement,

    /// The receiver clock jump detector shifted the clock by an integer
    /// millisecond but the residuals stayed out of band. The update is
    /// skipped and the clock left untouched.
    #[error("receiver clock jump could not be corrected")]
    ClockJumpUnrecoverable,

    /// Observation referenced a receiver clock the state does not carry.
    #[error("unknown receiver clock index {0}")]
    UnknownClockIndex(usize),
}
