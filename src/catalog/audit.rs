//! Offline checks over authored templates.
//!
//! Each template is rebuilt into the placement that solves it, once per
//! permitted transform, and each rebuilt placement must be accepted. The audit
//! also reports authoring problems, self-symmetric shapes and templates that
//! accept one another's solutions.

use std::fmt;
use std::sync::Arc;

use rayon::prelude::*;
use serde::Serialize;

use super::TemplateRegistry;
use crate::engine::matcher::{compare, expected_cells, match_snapshot, Mismatch};
use crate::engine::models::{Cell, PlacedTile, PlacementSnapshot};
use crate::engine::symmetry::{candidate_transforms, RotationConvention, Transform};
use crate::engine::template::Template;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AuditIssue {
    NoCells,
    DuplicateCells { cells: Vec<Cell> },
    MirrorFlagsIgnored,
    /// The solution carried through `transform` was not accepted.
    SolutionRejected { transform: Transform, detail: String },
    /// Another template accepts this template's solution.
    AcceptedBy { template_id: String },
}

impl fmt::Display for AuditIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditIssue::NoCells => write!(f, "no cells"),
            AuditIssue::DuplicateCells { cells } => {
                let list: Vec<String> = cells.iter().map(|c| c.to_string()).collect();
                write!(f, "duplicate cells {}", list.join(" "))
            }
            AuditIssue::MirrorFlagsIgnored => write!(f, "mirror flags set but never used"),
            AuditIssue::SolutionRejected { transform, detail } => {
                write!(f, "solution under {transform} rejected: {detail}")
            }
            AuditIssue::AcceptedBy { template_id } => {
                write!(f, "solution also accepted by '{template_id}'")
            }
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TemplateAudit {
    pub template_id: String,
    pub issues: Vec<AuditIssue>,
    /// Candidate transforms that explain the template's own solution.
    pub self_matches: usize,
}

impl TemplateAudit {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    /// The solution is explained by a non-trivial rotation too.
    pub fn is_self_symmetric(&self) -> bool {
        self.self_matches > RotationConvention::ALL.len()
    }
}

/// The placement that reproduces `template` as carried by `transform`.
///
/// Cells with no face requirement are placed face up. `None` if the carried
/// shape leaves the `i32` coordinate range.
pub fn solution_placement(template: &Template, transform: Transform) -> Option<PlacementSnapshot> {
    let expected = expected_cells(template, transform)?;
    Some(
        expected
            .into_iter()
            .map(|e| PlacedTile::new(e.position, e.rotation, e.face))
            .collect(),
    )
}

pub fn audit_template(template: &Template) -> TemplateAudit {
    let mut issues = Vec::new();
    let mut self_matches = 0;

    if !template.is_playable() {
        issues.push(AuditIssue::NoCells);
    }
    let dups = template.duplicate_positions();
    let has_dups = !dups.is_empty();
    if has_dups {
        issues.push(AuditIssue::DuplicateCells { cells: dups });
    }
    if template.rules.requests_mirroring() {
        issues.push(AuditIssue::MirrorFlagsIgnored);
    }

    if template.is_playable() && !has_dups {
        let transforms = candidate_transforms(template.rules.allow_global_rotation);
        for &transform in transforms {
            let detail = match solution_placement(template, transform) {
                Some(solution) => {
                    let report = match_snapshot(&solution, template);
                    if report.matched {
                        continue;
                    }
                    report.to_string()
                }
                None => Mismatch::OutOfRange.to_string(),
            };
            issues.push(AuditIssue::SolutionRejected { transform, detail });
        }

        let placed = solution_placement(template, Transform::IDENTITY).and_then(|s| s.anchored());
        if let Some(placed) = placed {
            self_matches = transforms
                .iter()
                .filter_map(|&t| expected_cells(template, t))
                .filter(|expected| compare(&placed, expected, &template.rules).is_ok())
                .count();
        }
    }

    TemplateAudit {
        template_id: template.id.clone(),
        issues,
        self_matches,
    }
}

/// Ids of the other templates that accept `template`'s solution.
fn accepted_by(template: &Template, others: &[Arc<Template>]) -> Vec<AuditIssue> {
    let Some(solution) = solution_placement(template, Transform::IDENTITY) else {
        return Vec::new();
    };
    if solution.is_empty() {
        return Vec::new();
    }
    others
        .iter()
        .filter(|other| other.id != template.id && match_snapshot(&solution, other).matched)
        .map(|other| AuditIssue::AcceptedBy {
            template_id: other.id.clone(),
        })
        .collect()
}

/// Audit every template in the registry, in registration order, and
/// cross-check their solutions against each other.
pub fn audit_registry(registry: &TemplateRegistry) -> Vec<TemplateAudit> {
    let templates: Vec<Arc<Template>> = registry.iter().cloned().collect();
    let audits: Vec<TemplateAudit> = templates
        .par_iter()
        .map(|t| {
            let mut audit = audit_template(t);
            audit.issues.extend(accepted_by(t, &templates));
            audit
        })
        .collect();

    for audit in &audits {
        if audit.is_clean() {
            tracing::debug!(template = %audit.template_id, self_matches = audit.self_matches, "template ok");
        } else {
            tracing::warn!(
                template = %audit.template_id,
                issues = audit.issues.len(),
                "template has authoring issues"
            );
        }
    }
    audits
}
