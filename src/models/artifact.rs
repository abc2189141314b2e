use crate::filter::Tagged;
use crate::layout::Keyed;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// A read-only timeline artifact (chart snapshot or note)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    pub id: String,

    #[serde(rename = "type")]
    pub artifact_type: ArtifactType,

    pub title: String,

    pub description: String,

    pub tags: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric: Option<ArtifactMetric>,

    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ArtifactType {
    /// Prometheus chart
    Prometheus,
    /// Grafana panel
    Grafana,
    Note,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactMetric {
    pub value: f64,
    pub label: String,
}

impl Keyed for Artifact {
    fn key(&self) -> &str {
        &self.id
    }
}

impl Tagged for Artifact {
    fn tags(&self) -> Vec<String> {
        self.tags.clone()
    }
}

/// The fixed artifacts shown on the demo timeline
pub fn demo_artifacts() -> Vec<Artifact> {
    vec![
        Artifact {
            id: "1".to_string(),
            artifact_type: ArtifactType::Prometheus,
            title: "CPU Usage Spike".to_string(),
            description: "Sudden increase in CPU usage detected".to_string(),
            tags: vec!["critical".to_string(), "performance".to_string()],
            metric: Some(ArtifactMetric {
                value: 92.0,
                label: "CPU Usage %".to_string(),
            }),
            content: "Prometheus chart data here".to_string(),
        },
        Artifact {
            id: "2".to_string(),
            artifact_type: ArtifactType::Grafana,
            title: "Memory Utilization".to_string(),
            description: "Memory usage over the last 24 hours".to_string(),
            tags: vec!["monitoring".to_string(), "resource".to_string()],
            metric: Some(ArtifactMetric {
                value: 76.0,
                label: "Memory Usage %".to_string(),
            }),
            content: "Grafana panel data here".to_string(),
        },
        Artifact {
            id: "3".to_string(),
            artifact_type: ArtifactType::Note,
            title: "Incident Response".to_string(),
            description: "Steps taken to mitigate the issue".to_string(),
            tags: vec!["action".to_string(), "resolution".to_string()],
            metric: None,
            content: "At 2:30 PM, we identified the root cause of the CPU spike and implemented a fix by optimizing the database queries.".to_string(),
        },
    ]
}
