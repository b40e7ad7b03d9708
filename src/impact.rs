//! Global impact dataset served by the impact map endpoint.

use serde::Serialize;

pub const IMPACT_SCORE: f64 = 0.96;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImpactNode {
    pub city: &'static str,
    pub impact: f64,
    pub field: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImpactMap {
    pub impact_score: f64,
    pub global_nodes: Vec<ImpactNode>,
}

pub fn impact_map() -> ImpactMap {
    ImpactMap {
        impact_score: IMPACT_SCORE,
        global_nodes: vec![
            ImpactNode {
                city: "Nairobi",
                impact: 0.92,
                field: "Agri-Tech",
            },
            ImpactNode {
                city: "Sao Paulo",
                impact: 0.88,
                field: "Quantum Grid",
            },
            ImpactNode {
                city: "Oslo",
                impact: 0.95,
                field: "Clean Energy",
            },
        ],
    }
}
