//! Caller permissions on mesh configuration
//!
//! Resolved fresh per request and never cached. Any review failure degrades
//! to "no permission" for the whole pair instead of failing the request.

use tracing::warn;

use crate::backends::AccessBackend;
use crate::models::{MeshResourceKind, ResourcePermissions};

/// Update/delete permission of the caller on `kind` objects in `namespace`
pub async fn resolve_permissions(
    access: &dyn AccessBackend,
    namespace: &str,
    kind: MeshResourceKind,
    read_only: bool,
) -> ResourcePermissions {
    if read_only {
        return ResourcePermissions::default();
    }

    let (update, delete) = futures::join!(
        access.can_i(namespace, kind, "update"),
        access.can_i(namespace, kind, "delete"),
    );

    match (update, delete) {
        (Ok(update), Ok(delete)) => ResourcePermissions { update, delete },
        (Err(err), _) | (_, Err(err)) => {
            warn!(
                namespace,
                kind = kind.kind(),
                error = %err,
                "permission review failed, assuming no permission"
            );
            ResourcePermissions::default()
        }
    }
}
