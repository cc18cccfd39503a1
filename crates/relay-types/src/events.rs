//! # Event Kinds
//!
//! The closed set of message kinds this build understands, in both
//! directions:
//!
//! - [`EmbedEvent`]: emitted by the embedded document, observed by the host.
//! - [`HostEvent`]: commands the host triggers on the embedded document.
//!
//! Both carry an `Unknown` variant so newer remote builds can send kinds this
//! host does not know yet; those are still routed by their raw name.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Declares a wire-named enum with an `Unknown(String)` passthrough.
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $(
                $(#[$vmeta:meta])*
                $variant:ident => $wire:literal,
            )*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                $variant,
            )*
            /// A kind not known to this build, carried verbatim.
            Unknown(String),
        }

        impl $name {
            /// Name of this kind on the wire.
            pub fn as_str(&self) -> &str {
                match self {
                    $( Self::$variant => $wire, )*
                    Self::Unknown(raw) => raw.as_str(),
                }
            }

            /// Whether this build knows the kind.
            pub fn is_known(&self) -> bool {
                !matches!(self, Self::Unknown(_))
            }
        }

        impl From<&str> for $name {
            fn from(raw: &str) -> Self {
                match raw {
                    $( $wire => Self::$variant, )*
                    other => Self::Unknown(other.to_string()),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                Ok(Self::from(raw.as_str()))
            }
        }
    };
}

wire_enum! {
    /// Events emitted by an embedded document.
    pub enum EmbedEvent {
        /// Wildcard: a subscription on `All` receives every event.
        All => "*",
        /// The embedded app booted and is about to authenticate.
        Init => "init",
        /// Authentication inside the embed completed.
        AuthInit => "authInit",
        /// The embed's session expired.
        AuthExpire => "authExpire",
        /// The embedded document finished loading.
        Load => "load",
        /// Data for the current view was (re)computed.
        Data => "data",
        FiltersChanged => "filtersChanged",
        QueryChanged => "queryChanged",
        Drilldown => "drillDown",
        DataSourceSelected => "dataSourceSelected",
        /// A user-defined action was clicked.
        CustomAction => "customAction",
        VizPointClick => "vizPointClick",
        VizPointDoubleClick => "vizPointDoubleClick",
        /// In-embed navigation happened.
        RouteChange => "ROUTE_CHANGE",
        /// The embedded document reported an error.
        Error => "Error",
        Alert => "alert",
        Save => "save",
        Download => "download",
        Pin => "pin",
        Present => "present",
        Edit => "edit",
        Share => "share",
        Explore => "explore",
        DialogOpen => "dialog-open",
        DialogClose => "dialog-close",
        GetDataClick => "getDataClick",
    }
}

wire_enum! {
    /// Commands the host can trigger on an embedded document.
    pub enum HostEvent {
        Search => "search",
        Filter => "filter",
        /// Reload the embedded document by reissuing its source.
        Reload => "reload",
        Drilldown => "triggerDrillDown",
        SetVisibleVizs => "SetPinboardVisibleVizs",
        UpdateRuntimeFilters => "UpdateRuntimeFilters",
        UpdateParameters => "UpdateParameters",
        Navigate => "Navigate",
        OpenFilter => "openFilter",
        AddColumns => "addColumns",
        RemoveColumn => "removeColumn",
        ResetSearch => "resetSearch",
        GetIframeUrl => "GetIframeUrl",
        Pin => "pin",
        Save => "save",
        Download => "download",
        Explore => "explore",
        /// Enter fullscreen presentation mode.
        Present => "present",
        Edit => "edit",
        Share => "share",
        Remove => "delete",
        GetTml => "getTML",
    }
}
