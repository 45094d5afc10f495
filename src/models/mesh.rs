//! Mesh configuration objects and the caller's permissions on them

use kube::core::DynamicObject;
use serde::Serialize;

/// Mesh configuration kinds shown on a service view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeshResourceKind {
    VirtualServices,
    DestinationRules,
}

impl MeshResourceKind {
    pub const GROUP: &'static str = "networking.istio.io";
    pub const VERSION: &'static str = "v1beta1";

    pub fn kind(&self) -> &'static str {
        match self {
            Self::VirtualServices => "VirtualService",
            Self::DestinationRules => "DestinationRule",
        }
    }

    pub fn plural(&self) -> &'static str {
        match self {
            Self::VirtualServices => "virtualservices",
            Self::DestinationRules => "destinationrules",
        }
    }

    pub fn api_version(&self) -> String {
        format!("{}/{}", Self::GROUP, Self::VERSION)
    }
}

/// Whether the caller may update/delete objects of one kind in a namespace
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ResourcePermissions {
    pub update: bool,
    pub delete: bool,
}

/// A mesh configuration object as shown to the caller
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeshObject {
    pub name: String,
    pub namespace: String,
    pub created_at: Option<String>,
    pub resource_version: Option<String>,
    pub spec: serde_json::Value,
}

impl MeshObject {
    pub fn parse(obj: &DynamicObject) -> Self {
        let meta = &obj.metadata;
        Self {
            name: meta.name.clone().unwrap_or_default(),
            namespace: meta.namespace.clone().unwrap_or_default(),
            created_at: super::created_at(meta),
            resource_version: meta.resource_version.clone(),
            spec: obj
                .data
                .get("spec")
                .cloned()
                .unwrap_or(serde_json::Value::Null),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MeshObjectList {
    pub items: Vec<MeshObject>,
    pub permissions: ResourcePermissions,
}

impl MeshObjectList {
    pub fn new(objects: &[DynamicObject], permissions: ResourcePermissions) -> Self {
        Self {
            items: objects.iter().map(MeshObject::parse).collect(),
            permissions,
        }
    }
}
