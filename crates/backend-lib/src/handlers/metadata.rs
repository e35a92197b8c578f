//! Versioned enumeration tables for the front-end.

use std::sync::Arc;

use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::facets::{
    table, DecisionRule, Deliverable, Facet, MeetingGoal, MetadataEntry, ParticipationFormat,
};
use crate::AppState;

pub const METADATA_VERSION: &str = "1.0";

#[derive(Debug, Clone, Serialize)]
pub struct MetadataTable {
    pub version: &'static str,
    pub data: Vec<MetadataEntry>,
}

fn table_of<F: Facet>() -> Json<MetadataTable> {
    Json(MetadataTable {
        version: METADATA_VERSION,
        data: table::<F>(),
    })
}

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/metadata/meeting-goals", get(meeting_goals))
        .route("/metadata/participation-formats", get(participation_formats))
        .route("/metadata/decision-rules", get(decision_rules))
        .route("/metadata/deliverables", get(deliverables))
}

async fn meeting_goals() -> Json<MetadataTable> {
    table_of::<MeetingGoal>()
}

async fn participation_formats() -> Json<MetadataTable> {
    table_of::<ParticipationFormat>()
}

async fn decision_rules() -> Json<MetadataTable> {
    table_of::<DecisionRule>()
}

async fn deliverables() -> Json<MetadataTable> {
    table_of::<Deliverable>()
}
