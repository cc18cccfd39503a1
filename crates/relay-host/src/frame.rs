//! The embedded document's messaging endpoint, as seen by the host.

use relay_types::{CommandEnvelope, Origin, ReplyPort, TransportError};

/// A rendered embedded document the host can post to.
///
/// Implementations wrap whatever actually hosts the document. Posting is
/// fire-and-forget; replies come back through the transferred [`ReplyPort`].
pub trait RemoteFrame: Send + Sync {
    /// Whether the document is attached and can receive messages.
    fn is_rendered(&self) -> bool;

    /// Post a command, restricted to `target_origin`.
    ///
    /// Implementations must not deliver when the document's actual origin
    /// differs from `target_origin`.
    fn post_message(
        &self,
        envelope: CommandEnvelope,
        target_origin: &Origin,
        port: Option<ReplyPort>,
    ) -> Result<(), TransportError>;

    /// Reload the document by reassigning its source.
    fn reissue_source(&self) -> Result<(), TransportError>;

    /// Source URL of the document, used to derive the expected origin when
    /// none is configured.
    fn source(&self) -> Option<String> {
        None
    }
}
