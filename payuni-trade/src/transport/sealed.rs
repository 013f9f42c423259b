pub(crate) mod private {
    /// Marker restricting [`Transport`](crate::transport::Transport) to this crate.
    pub trait Sealed {}
}
