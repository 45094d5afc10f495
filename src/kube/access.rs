//! Access reviews for the identity behind the client

use async_trait::async_trait;
use k8s_openapi::api::authorization::v1::{
    ResourceAttributes, SelfSubjectAccessReview, SelfSubjectAccessReviewSpec,
};
use kube::api::PostParams;
use kube::{Api, Client};

use crate::backends::AccessBackend;
use crate::error::Result;
use crate::models::MeshResourceKind;

/// [`AccessBackend`] answering through `SelfSubjectAccessReview`
#[derive(Clone)]
pub struct KubeAccessReviewer {
    client: Client,
}

impl KubeAccessReviewer {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

fn review_for(namespace: &str, kind: MeshResourceKind, verb: &str) -> SelfSubjectAccessReview {
    SelfSubjectAccessReview {
        spec: SelfSubjectAccessReviewSpec {
            resource_attributes: Some(ResourceAttributes {
                namespace: Some(namespace.to_string()),
                group: Some(MeshResourceKind::GROUP.to_string()),
                resource: Some(kind.plural().to_string()),
                verb: Some(verb.to_string()),
                ..Default::default()
            }),
            ..Default::default()
        },
        ..Default::default()
    }
}

#[async_trait]
impl AccessBackend for KubeAccessReviewer {
    async fn can_i(&self, namespace: &str, kind: MeshResourceKind, verb: &str) -> Result<bool> {
        let api: Api<SelfSubjectAccessReview> = Api::all(self.client.clone());
        let review = api
            .create(&PostParams::default(), &review_for(namespace, kind, verb))
            .await?;
        Ok(review.status.is_some_and(|s| s.allowed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_review_attributes() {
        let review = review_for("bookinfo", MeshResourceKind::DestinationRules, "delete");
        let attrs = review.spec.resource_attributes.unwrap();
        assert_eq!(attrs.namespace.as_deref(), Some("bookinfo"));
        assert_eq!(attrs.group.as_deref(), Some("networking.istio.io"));
        assert_eq!(attrs.resource.as_deref(), Some("destinationrules"));
        assert_eq!(attrs.verb.as_deref(), Some("delete"));
    }
}
