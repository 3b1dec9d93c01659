//! XMP namespace registry
//!
//! `Xmp.<prefix>.<Property>` keys name their schema by prefix, so every
//! prefix a key uses must be bound to a namespace URI here. The builtin
//! schemas are always bound; [`register_namespace`] adds more at runtime.

use crate::core::error::{MetaError, MetaResult};
use std::collections::BTreeMap;
use std::sync::{OnceLock, PoisonError, RwLock, RwLockReadGuard};

/// URIs the codecs refer to directly
pub mod ns {
    pub const XMP: &str = "http://ns.adobe.com/xap/1.0/";
    pub const DC: &str = "http://purl.org/dc/elements/1.1/";
    pub const RDF: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
    pub const XML: &str = "http://www.w3.org/XML/1998/namespace";
    /// Wrapper element `x:xmpmeta`
    pub const ADOBE_META: &str = "adobe:ns:meta/";
}

/// Prefix and URI of every schema bound from the start
const BUILTIN: &[(&str, &str)] = &[
    ("dc", ns::DC),
    ("xmp", ns::XMP),
    ("xmpRights", "http://ns.adobe.com/xap/1.0/rights/"),
    ("xmpMM", "http://ns.adobe.com/xap/1.0/mm/"),
    ("xmpBJ", "http://ns.adobe.com/xap/1.0/bj/"),
    ("xmpTPg", "http://ns.adobe.com/xap/1.0/t/pg/"),
    ("xmpidq", "http://ns.adobe.com/xmp/Identifier/qual/1.0/"),
    ("xmpDM", "http://ns.adobe.com/xmp/1.0/DynamicMedia/"),
    ("pdf", "http://ns.adobe.com/pdf/1.3/"),
    ("photoshop", "http://ns.adobe.com/photoshop/1.0/"),
    ("crs", "http://ns.adobe.com/camera-raw-settings/1.0/"),
    ("tiff", "http://ns.adobe.com/tiff/1.0/"),
    ("exif", "http://ns.adobe.com/exif/1.0/"),
    ("aux", "http://ns.adobe.com/exif/1.0/aux/"),
    ("lr", "http://ns.adobe.com/lightroom/1.0/"),
    ("Iptc4xmpCore", "http://iptc.org/std/Iptc4xmpCore/1.0/xmlns/"),
    ("Iptc4xmpExt", "http://iptc.org/std/Iptc4xmpExt/2008-02-29/"),
    ("plus", "http://ns.useplus.org/ldf/xmp/1.0/"),
    ("stEvt", "http://ns.adobe.com/xap/1.0/sType/ResourceEvent#"),
    ("stRef", "http://ns.adobe.com/xap/1.0/sType/ResourceRef#"),
    ("stDim", "http://ns.adobe.com/xap/1.0/sType/Dimensions#"),
    ("rdf", ns::RDF),
    ("xml", ns::XML),
    ("x", ns::ADOBE_META),
];

/// Two-way binding between prefixes and namespace URIs
#[derive(Debug, Clone, Default)]
pub struct NamespaceMap {
    by_prefix: BTreeMap<String, String>,
    by_uri: BTreeMap<String, String>,
}

impl NamespaceMap {
    /// A map holding the builtin schemas
    pub fn with_builtins() -> Self {
        let mut map = Self::default();
        for (prefix, uri) in BUILTIN {
            map.bind(uri, prefix);
        }
        map
    }

    /// Bind `prefix` to `uri`
    ///
    /// Rebinding a prefix to the URI it already has is a no-op; binding it
    /// to another URI fails.
    pub fn register(&mut self, uri: &str, prefix: &str) -> MetaResult<()> {
        if uri.is_empty() || prefix.is_empty() {
            return Err(MetaError::BadParam(format!(
                "Namespace needs both a prefix and a URI, got '{}'='{}'",
                prefix, uri
            )));
        }
        match self.by_prefix.get(prefix) {
            Some(bound) if bound == uri => Ok(()),
            Some(bound) => Err(MetaError::BadParam(format!(
                "Prefix '{}' is already bound to '{}'",
                prefix, bound
            ))),
            None => {
                self.bind(uri, prefix);
                Ok(())
            }
        }
    }

    /// Bind without checks; a later binding of either side replaces the earlier one
    pub(crate) fn bind(&mut self, uri: &str, prefix: &str) {
        self.by_prefix.insert(prefix.to_string(), uri.to_string());
        self.by_uri.insert(uri.to_string(), prefix.to_string());
    }

    pub fn prefix(&self, uri: &str) -> Option<&str> {
        self.by_uri.get(uri).map(String::as_str)
    }

    pub fn uri(&self, prefix: &str) -> Option<&str> {
        self.by_prefix.get(prefix).map(String::as_str)
    }
}

static REGISTRY: OnceLock<RwLock<NamespaceMap>> = OnceLock::new();

fn registry() -> &'static RwLock<NamespaceMap> {
    REGISTRY.get_or_init(|| RwLock::new(NamespaceMap::with_builtins()))
}

// The map holds no invariant a panicking writer could break halfway
fn read_registry() -> RwLockReadGuard<'static, NamespaceMap> {
    registry().read().unwrap_or_else(PoisonError::into_inner)
}

/// Bind a prefix to a namespace URI for the whole process
///
/// # Errors
///
/// [`MetaError::BadParam`] when either side is empty or the prefix is
/// already bound to a different URI.
pub fn register_namespace(uri: &str, prefix: &str) -> MetaResult<()> {
    let mut map = registry().write().unwrap_or_else(PoisonError::into_inner);
    map.register(uri, prefix)?;
    log::debug!("Registered XMP namespace {}={}", prefix, uri);
    Ok(())
}

/// Prefix bound to `uri` in the process registry
pub fn prefix_for_uri(uri: &str) -> Option<String> {
    read_registry().prefix(uri).map(str::to_string)
}

/// URI bound to `prefix` in the process registry
pub fn uri_for_prefix(prefix: &str) -> Option<String> {
    read_registry().uri(prefix).map(str::to_string)
}

pub(crate) fn ensure_registry() {
    registry();
}
