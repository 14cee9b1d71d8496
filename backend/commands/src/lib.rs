//! `cmdrouter-commands` routes free-form chat messages to plugin commands
//! by asking a language model to pick one from the live command catalog.

pub mod catalog;
pub mod codec;
pub mod detection;
pub mod dispatch;
pub mod filter;
pub mod lifecycle;
pub mod matcher;
pub mod router;

pub use catalog::{Catalog, CatalogDiff, CatalogEntry, CatalogKey, CatalogSnapshot, CommandBrief};
pub use codec::{build_catalog_prompt, parse_response, render_catalog, MatchResult};
pub use detection::{detect_command, SlashCommand, SlashInvocation};
pub use dispatch::{describe, DispatchStream, Dispatcher};
pub use filter::{entry_filter, permission_filter};
pub use lifecycle::SyncController;
pub use matcher::{Matcher, NO_PROVIDER_MESSAGE};
pub use router::CommandRouter;
