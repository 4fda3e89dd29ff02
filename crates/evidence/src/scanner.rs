use crate::error::{EvidenceError, Result};
use crate::limits::ScanLimits;
use crate::routes::{may_declare_routes, scan_routes, Endpoint};
use crate::schema::SchemaCatalog;
use crate::scope::ScanScope;
use crate::snippets::{window, Snippet};
use crate::surfaces::{is_ci_config, is_ui_surface, scan_ci_config, CiWorkflow};
use crate::test_files::{is_test_file, scan_test_file, TestFile};
use crate::text::extension;
use crate::tree::SourceTree;
use reqgate_protocol::{EvidenceItem, EvidenceKind, Locator, Truncation};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const ROUTE_SNIPPETS_PER_FILE: usize = 2;
const TEST_SNIPPETS_PER_FILE: usize = 1;

/// Bounded, deterministic inventory of what a codebase demonstrably contains.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanReport {
    pub files_scanned: usize,
    /// Extension (`.ts`, `(no_ext)`) to file count
    pub file_extensions: BTreeMap<String, usize>,
    pub endpoints: Vec<Endpoint>,
    pub schema: SchemaCatalog,
    pub tests: Vec<TestFile>,
    pub ui_surfaces: Vec<String>,
    pub ci_workflows: Vec<CiWorkflow>,
    /// Files that produced route or test evidence
    pub evidence_paths: Vec<String>,
    pub snippets: Vec<Snippet>,
    /// Caps that cut a collection short; what was dropped is unknown, not absent
    pub truncated: Vec<Truncation>,
}

impl ScanReport {
    pub fn is_truncated(&self, which: Truncation) -> bool {
        self.truncated.contains(&which)
    }

    /// Every finding as typed evidence, grouped by kind (route, db, test, ui, ci, file).
    pub fn evidence_items(&self) -> Vec<EvidenceItem> {
        let mut items = Vec::new();

        for endpoint in &self.endpoints {
            let locator = match endpoint.line {
                Some(line) => Locator::line(&endpoint.file, line),
                None => Locator::file(&endpoint.file),
            };
            items.push(EvidenceItem::new(
                EvidenceKind::Route,
                locator,
                endpoint.signature(),
            ));
        }

        for (table_name, table) in &self.schema.tables {
            if table.columns.is_empty() {
                if let Some(source) = table.sources.iter().next() {
                    items.push(EvidenceItem::new(
                        EvidenceKind::Db,
                        Locator::file(source),
                        table_name.clone(),
                    ));
                }
                continue;
            }
            for (column, def) in &table.columns {
                items.push(EvidenceItem::new(
                    EvidenceKind::Db,
                    Locator::line(&def.file, def.line),
                    format!("{table_name}.{column}"),
                ));
            }
        }

        for test in &self.tests {
            let item = match test.cases.first() {
                Some(case) => EvidenceItem::new(
                    EvidenceKind::Test,
                    Locator::line(&test.file, case.line),
                    format!("{} ({})", test.framework, case.name),
                ),
                None => EvidenceItem::new(
                    EvidenceKind::Test,
                    Locator::file(&test.file),
                    test.framework.as_str(),
                ),
            };
            items.push(item);
        }

        for path in &self.ui_surfaces {
            items.push(EvidenceItem::new(
                EvidenceKind::Ui,
                Locator::file(path),
                path.clone(),
            ));
        }

        for ci in &self.ci_workflows {
            items.push(EvidenceItem::new(
                EvidenceKind::Ci,
                Locator::file(&ci.file),
                ci.name.clone(),
            ));
        }

        for path in &self.evidence_paths {
            items.push(EvidenceItem::new(
                EvidenceKind::File,
                Locator::file(path),
                path.clone(),
            ));
        }

        items
    }

    /// Evidence histogram; every kind is present, possibly with zero.
    pub fn kind_counts(&self) -> BTreeMap<EvidenceKind, usize> {
        let mut counts: BTreeMap<EvidenceKind, usize> =
            EvidenceKind::ALL.iter().map(|kind| (*kind, 0)).collect();
        for item in self.evidence_items() {
            *counts.entry(item.kind).or_default() += 1;
        }
        counts
    }
}

/// Single-pass scanner over a [`SourceTree`].
#[derive(Debug, Clone, Default)]
pub struct EvidenceScanner {
    limits: ScanLimits,
    scope: ScanScope,
}

impl EvidenceScanner {
    pub fn new(limits: ScanLimits) -> Result<Self> {
        limits.validate().map_err(EvidenceError::invalid_limits)?;
        Ok(Self {
            limits,
            scope: ScanScope::default(),
        })
    }

    #[must_use]
    pub fn with_scope(mut self, scope: ScanScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn limits(&self) -> &ScanLimits {
        &self.limits
    }

    pub fn scan<T: SourceTree + ?Sized>(&self, tree: &T) -> ScanReport {
        let limits = &self.limits;
        let mut report = ScanReport::default();
        let mut truncated = Vec::new();
        let mut migrations_seen = 0usize;
        let mut evidence_paths = Vec::new();
        let mut ui_surfaces = Vec::new();

        for rel in tree.files() {
            if !self.scope.allows(&rel) {
                continue;
            }
            report.files_scanned += 1;
            let ext_key = extension(&rel)
                .map_or_else(|| "(no_ext)".to_string(), |e| format!(".{e}"));
            *report.file_extensions.entry(ext_key).or_default() += 1;

            if is_ui_surface(&rel) {
                ui_surfaces.push(rel.clone());
            }

            let is_migration = SchemaCatalog::is_migration_file(&rel);
            let routes_candidate = may_declare_routes(&rel);
            let test_candidate = is_test_file(&rel);
            let ci_candidate = is_ci_config(&rel);
            if !(is_migration || routes_candidate || test_candidate || ci_candidate) {
                continue;
            }
            let Some(text) = tree.read(&rel) else {
                continue;
            };

            if is_migration {
                migrations_seen += 1;
                if migrations_seen <= limits.max_migration_files {
                    report.schema.apply_migration(&rel, &text);
                } else {
                    push_flag(&mut truncated, Truncation::MaxMigrationFiles);
                }
            }

            if routes_candidate {
                let endpoints = scan_routes(&rel, &text);
                if !endpoints.is_empty() {
                    evidence_paths.push(rel.clone());
                    let anchors = endpoints
                        .iter()
                        .filter_map(|e| e.line)
                        .take(ROUTE_SNIPPETS_PER_FILE);
                    for line in anchors {
                        report.snippets.extend(window(
                            EvidenceKind::Route,
                            &rel,
                            &text,
                            line,
                            limits.snippet_context_lines,
                            limits.snippet_max_chars,
                        ));
                    }
                    report.endpoints.extend(endpoints);
                }
            }

            if test_candidate {
                if let Some(test) = scan_test_file(&rel, &text, limits.max_test_names_per_file) {
                    evidence_paths.push(rel.clone());
                    for case in test.cases.iter().take(TEST_SNIPPETS_PER_FILE) {
                        report.snippets.extend(window(
                            EvidenceKind::Test,
                            &rel,
                            &text,
                            case.line,
                            limits.snippet_context_lines,
                            limits.snippet_max_chars,
                        ));
                    }
                    report.tests.push(test);
                }
            }

            if ci_candidate {
                report.ci_workflows.extend(scan_ci_config(&rel, &text));
            }
        }

        ui_surfaces.sort();
        ui_surfaces.dedup();
        evidence_paths.sort();
        evidence_paths.dedup();
        report.ui_surfaces = ui_surfaces;
        report.evidence_paths = evidence_paths;

        cap(&mut report.endpoints, limits.max_endpoints, Truncation::MaxEndpoints, &mut truncated);
        cap(&mut report.tests, limits.max_tests, Truncation::MaxTests, &mut truncated);
        cap(
            &mut report.ui_surfaces,
            limits.max_ui_surfaces,
            Truncation::MaxUiSurfaces,
            &mut truncated,
        );
        cap(
            &mut report.ci_workflows,
            limits.max_ci_workflows,
            Truncation::MaxCiWorkflows,
            &mut truncated,
        );
        cap(
            &mut report.evidence_paths,
            limits.max_evidence_paths,
            Truncation::MaxEvidencePaths,
            &mut truncated,
        );
        cap(&mut report.snippets, limits.max_snippets, Truncation::MaxSnippets, &mut truncated);

        truncated.sort();
        report.truncated = truncated;

        log::info!(
            "Scanned {} files: {} endpoints, {} tables, {} test files, {} UI surfaces, {} CI workflows",
            report.files_scanned,
            report.endpoints.len(),
            report.schema.tables.len(),
            report.tests.len(),
            report.ui_surfaces.len(),
            report.ci_workflows.len()
        );
        for flag in &report.truncated {
            log::warn!("Scan output truncated by {}", flag.as_str());
        }
        report
    }
}

fn cap<T>(items: &mut Vec<T>, max: usize, flag: Truncation, truncated: &mut Vec<Truncation>) {
    if items.len() > max {
        items.truncate(max);
        push_flag(truncated, flag);
    }
}

fn push_flag(truncated: &mut Vec<Truncation>, flag: Truncation) {
    if !truncated.contains(&flag) {
        truncated.push(flag);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::MemoryTree;
    use pretty_assertions::assert_eq;

    fn ride_tree() -> MemoryTree {
        MemoryTree::new()
            .with_file(
                "app/api/rides/[id]/route.ts",
                "import { db } from '@/db';\n\nexport async function GET(req) {\n  return db.ride();\n}\n",
            )
            .with_file(
                "app/api/rides/[id]/route.test.ts",
                "describe('ride lookup', () => {\n  it('returns the ride', () => {});\n});\n",
            )
            .with_file(
                "supabase/migrations/001_rides.sql",
                "create table rides (\n  id uuid primary key,\n  driver_id uuid\n);\n",
            )
            .with_file("apps/web/app/rides/page.tsx", "export default function Page() {}\n")
            .with_file(".github/workflows/ci.yml", "name: CI\non: push\n")
            .with_file("README", "hello\n")
    }

    #[test]
    fn finds_every_kind_of_evidence() {
        let report = EvidenceScanner::default().scan(&ride_tree());

        assert_eq!(report.files_scanned, 6);
        assert_eq!(report.endpoints[0].signature(), "GET /api/rides/:id");
        assert_eq!(report.endpoints[0].line, Some(3));
        assert_eq!(report.schema.tables["rides"].columns.len(), 2);
        assert_eq!(report.tests[0].cases.len(), 2);
        assert_eq!(report.ui_surfaces, vec!["apps/web/app/rides/page.tsx"]);
        assert_eq!(report.ci_workflows[0].name, "CI");
        assert_eq!(
            report.evidence_paths,
            vec!["app/api/rides/[id]/route.test.ts", "app/api/rides/[id]/route.ts"]
        );
        assert_eq!(report.file_extensions["(no_ext)"], 1);
        assert_eq!(report.file_extensions[".ts"], 2);
        assert!(report.truncated.is_empty());
    }

    #[test]
    fn evidence_items_are_grouped_by_kind() {
        let report = EvidenceScanner::default().scan(&ride_tree());
        let items = report.evidence_items();
        let kinds: Vec<_> = items.iter().map(|i| i.kind).collect();
        let mut sorted = kinds.clone();
        sorted.sort();
        assert_eq!(kinds, sorted);

        assert_eq!(
            items[0].citation(),
            "route:GET /api/rides/:id @ app/api/rides/[id]/route.ts:3"
        );
        let counts = report.kind_counts();
        assert_eq!(counts[&EvidenceKind::Db], 2);
        assert_eq!(counts[&EvidenceKind::File], 2);
        assert_eq!(counts[&EvidenceKind::Other], 0);
    }

    #[test]
    fn snippets_surround_route_and_test_anchors() {
        let report = EvidenceScanner::default().scan(&ride_tree());
        let kinds: Vec<_> = report.snippets.iter().map(|s| s.kind).collect();
        assert_eq!(kinds, vec![EvidenceKind::Test, EvidenceKind::Route]);
        assert!(report.snippets[1].text.contains("export async function GET"));
    }

    #[test]
    fn caps_record_truncation() {
        let mut tree = MemoryTree::new();
        for i in 0..5 {
            tree.insert(format!("src/r{i}.js"), format!("router.get('/r{i}', h);\n"));
        }
        let limits = ScanLimits {
            max_endpoints: 3,
            max_snippets: 2,
            ..Default::default()
        };
        let report = EvidenceScanner::new(limits).unwrap().scan(&tree);
        assert_eq!(report.endpoints.len(), 3);
        assert_eq!(report.endpoints[2].path, "/r2");
        assert_eq!(report.snippets.len(), 2);
        assert_eq!(
            report.truncated,
            vec![Truncation::MaxEndpoints, Truncation::MaxSnippets]
        );
        assert!(report.is_truncated(Truncation::MaxEndpoints));
    }

    #[test]
    fn migration_cap_keeps_path_order() {
        let mut tree = MemoryTree::new();
        for i in 0..3 {
            tree.insert(
                format!("db/migrations/00{i}.sql"),
                format!("create table t{i} (id int);\n"),
            );
        }
        let limits = ScanLimits {
            max_migration_files: 2,
            ..Default::default()
        };
        let report = EvidenceScanner::new(limits).unwrap().scan(&tree);
        let tables: Vec<_> = report.schema.tables.keys().map(String::as_str).collect();
        assert_eq!(tables, vec!["t0", "t1"]);
        assert_eq!(report.truncated, vec![Truncation::MaxMigrationFiles]);
    }

    #[test]
    fn scope_limits_visited_paths() {
        let scope = ScanScope {
            exclude: vec!["supabase".to_string()],
            ..Default::default()
        };
        let report = EvidenceScanner::default().with_scope(scope).scan(&ride_tree());
        assert!(report.schema.tables.is_empty());
        assert_eq!(report.files_scanned, 5);
    }

    #[test]
    fn invalid_limits_are_rejected() {
        let limits = ScanLimits {
            max_tests: 0,
            ..Default::default()
        };
        assert!(matches!(
            EvidenceScanner::new(limits),
            Err(EvidenceError::InvalidLimits(_))
        ));
    }
}
