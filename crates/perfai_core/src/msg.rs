#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// The fetch for this cycle returned a decoded snapshot.
    FetchSucceeded(crate::RawJobResponse),
    /// The fetch for this cycle failed in transport (network, non-2xx, decode).
    FetchFailed { detail: String },
}
