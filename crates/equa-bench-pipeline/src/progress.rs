// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelinePhase {
    Prepare,
    Statistics,
    Correlations,
    TopPerformers,
    Complete,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineEvent {
    pub phase: PipelinePhase,
    pub name: String,
    pub fields: BTreeMap<String, String>,
}

#[derive(Debug, Default, Clone)]
pub struct PipelineLog {
    events: Vec<PipelineEvent>,
}

impl PipelineLog {
    pub fn emit(
        &mut self,
        phase: PipelinePhase,
        name: impl Into<String>,
        fields: BTreeMap<String, String>,
    ) {
        self.events.push(PipelineEvent {
            phase,
            name: name.into(),
            fields,
        });
    }

    #[must_use]
    pub fn events(&self) -> &[PipelineEvent] {
        &self.events
    }
}
