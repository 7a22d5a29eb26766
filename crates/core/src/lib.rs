pub mod artifacts;
pub mod catalog;
pub mod config;
pub mod domain;
pub mod errors;
pub mod fixtures;
pub mod neighbors;
pub mod recommend;
pub mod rules;

pub use artifacts::{ArtifactBundle, ArtifactError, ArtifactKind, ArtifactSummary};
pub use catalog::ProductCatalog;
pub use domain::product::{Product, ProductId, ProductIndex};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use neighbors::{NeighborEdge, NeighborTable};
pub use recommend::{
    HybridScorer, Recommendation, RecommendRequest, Recommender, ResolvedCart, SignalType,
};
pub use rules::{AntecedentKey, AssociationRule, RawRule, RuleTable};
