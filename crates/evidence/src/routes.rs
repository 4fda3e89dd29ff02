use crate::text::{extension, line_of_offset};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Extensions scanned for router call syntax.
const CALL_SYNTAX_EXTENSIONS: &[&str] = &["ts", "tsx", "js", "jsx", "mjs", "cjs", "py"];

/// Extensions scanned for controller decorators.
const DECORATOR_EXTENSIONS: &[&str] = &["ts", "js", "mjs", "cjs"];

static CALL_ROUTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)\b(?:router|app|fastify)\.(get|post|put|patch|delete)\s*\(\s*(?:'([^']*)'|"([^"]*)"|`([^`]*)`)"#,
    )
    .expect("valid call route regex")
});

static CONTROLLER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"@Controller\(\s*(?:'([^']*)'|"([^"]*)"|`([^`]*)`)?"#)
        .expect("valid controller regex")
});

static METHOD_DECORATOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"@(Get|Post|Put|Patch|Delete|All)\(\s*(?:'([^']*)'|"([^"]*)"|`([^`]*)`)?\s*\)"#,
    )
    .expect("valid method decorator regex")
});

static ROUTE_FILE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(^|/)api/.+/route\.(ts|tsx|js|jsx)$").expect("valid route file regex")
});

static EXPORTED_HANDLER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\bexport\s+(?:(?:async\s+)?function\s+|const\s+)(GET|POST|PUT|PATCH|DELETE|HEAD|OPTIONS)\b",
    )
    .expect("valid exported handler regex")
});

static DYNAMIC_SEGMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\[{1,2}(?:\.\.\.)?([^\[\]]+)\]{1,2}$").expect("valid dynamic segment regex")
});

/// How an endpoint was discovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteSource {
    /// `router.get('/x', …)` style registration
    CallSyntax,
    /// `@Controller('x')` + `@Get('y')`
    Decorator,
    /// `app/api/<segments>/route.ts`
    FileConvention,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub method: String,
    pub path: String,
    pub file: String,
    /// 1-based; absent for file-convention routes that declare no handler
    pub line: Option<usize>,
    pub source: RouteSource,
}

impl Endpoint {
    pub fn signature(&self) -> String {
        format!("{} {}", self.method, self.path)
    }
}

/// Whether `scan_routes` could find anything in this path.
pub fn may_declare_routes(rel_path: &str) -> bool {
    let ext = extension(rel_path).unwrap_or_default();
    ROUTE_FILE.is_match(rel_path) || CALL_SYNTAX_EXTENSIONS.contains(&ext.as_str())
}

/// Every endpoint declared by one file, in discovery order.
pub fn scan_routes(rel_path: &str, text: &str) -> Vec<Endpoint> {
    let mut endpoints = Vec::new();
    let ext = extension(rel_path).unwrap_or_default();

    if ROUTE_FILE.is_match(rel_path) {
        endpoints.extend(file_convention_endpoints(rel_path, text));
    }
    if CALL_SYNTAX_EXTENSIONS.contains(&ext.as_str()) {
        endpoints.extend(call_syntax_endpoints(rel_path, text));
    }
    if DECORATOR_EXTENSIONS.contains(&ext.as_str()) {
        endpoints.extend(decorator_endpoints(rel_path, text));
    }
    endpoints
}

fn call_syntax_endpoints(rel_path: &str, text: &str) -> Vec<Endpoint> {
    CALL_ROUTE
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let path = first_literal(&caps, 2)?;
            Some(Endpoint {
                method: caps[1].to_uppercase(),
                path: path.to_string(),
                file: rel_path.to_string(),
                line: Some(line_of_offset(text, whole.start())),
                source: RouteSource::CallSyntax,
            })
        })
        .collect()
}

fn decorator_endpoints(rel_path: &str, text: &str) -> Vec<Endpoint> {
    let controllers: Vec<(usize, String)> = CONTROLLER
        .captures_iter(text)
        .filter_map(|caps| {
            let start = caps.get(0)?.start();
            Some((start, first_literal(&caps, 1).unwrap_or_default().to_string()))
        })
        .collect();
    if controllers.is_empty() {
        return Vec::new();
    }

    METHOD_DECORATOR
        .captures_iter(text)
        .filter_map(|caps| {
            let start = caps.get(0)?.start();
            // A handler belongs to the closest controller declared above it.
            let prefix = controllers
                .iter()
                .rev()
                .find(|(offset, _)| *offset < start)
                .map(|(_, prefix)| prefix.as_str())?;
            let sub = first_literal(&caps, 2).unwrap_or_default();
            let method = match &caps[1] {
                "All" => "ANY".to_string(),
                other => other.to_uppercase(),
            };
            Some(Endpoint {
                method,
                path: join_route(prefix, sub),
                file: rel_path.to_string(),
                line: Some(line_of_offset(text, start)),
                source: RouteSource::Decorator,
            })
        })
        .collect()
}

fn file_convention_endpoints(rel_path: &str, text: &str) -> Vec<Endpoint> {
    let Some(path) = derive_api_path(rel_path) else {
        return Vec::new();
    };
    let handlers: Vec<Endpoint> = EXPORTED_HANDLER
        .captures_iter(text)
        .filter_map(|caps| {
            let m = caps.get(1)?;
            Some(Endpoint {
                method: m.as_str().to_string(),
                path: path.clone(),
                file: rel_path.to_string(),
                line: Some(line_of_offset(text, m.start())),
                source: RouteSource::FileConvention,
            })
        })
        .collect();
    if !handlers.is_empty() {
        return handlers;
    }
    vec![Endpoint {
        method: "ANY".to_string(),
        path,
        file: rel_path.to_string(),
        line: None,
        source: RouteSource::FileConvention,
    }]
}

/// Map `app/api/rides/[id]/route.ts` to `/api/rides/:id`.
///
/// Route groups like `(admin)` vanish, `[id]` and `[...slug]` become `:id` and `:slug`.
pub fn derive_api_path(rel_path: &str) -> Option<String> {
    let parts: Vec<&str> = rel_path.split('/').collect();
    let api_idx = parts.iter().position(|p| p.eq_ignore_ascii_case("api"))?;
    let mut after = &parts[api_idx + 1..];
    if let Some(last) = after.last() {
        if last.starts_with("route.") {
            after = &after[..after.len() - 1];
        }
    }

    let segments: Vec<String> = after
        .iter()
        .filter(|s| !(s.starts_with('(') && s.ends_with(')')))
        .map(|s| match DYNAMIC_SEGMENT.captures(s) {
            Some(caps) => format!(":{}", &caps[1]),
            None => (*s).to_string(),
        })
        .collect();
    Some(format!("/api/{}", segments.join("/")))
}

fn join_route(prefix: &str, sub: &str) -> String {
    let joined = format!("/{prefix}/{sub}");
    let parts: Vec<&str> = joined.split('/').filter(|p| !p.is_empty()).collect();
    format!("/{}", parts.join("/"))
}

fn first_literal<'t>(caps: &regex::Captures<'t>, first_group: usize) -> Option<&'t str> {
    (first_group..first_group + 3).find_map(|idx| caps.get(idx).map(|m| m.as_str()))
}
