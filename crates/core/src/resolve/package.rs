//! `package.json` reading: entry points, conditional `exports`, workspaces.

use serde_json::Value;
use std::path::Path;

/// Condition keys honored in `exports`, highest priority first.
pub const EXPORT_CONDITIONS: &[&str] = &["types", "import", "require", "node", "default"];

pub fn read_manifest(dir: &Path) -> Option<Value> {
    let text = std::fs::read_to_string(dir.join("package.json")).ok()?;
    match serde_json::from_str(&text) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::debug!("unreadable package.json in {}: {}", dir.display(), e);
            None
        }
    }
}

pub fn package_name(manifest: &Value) -> Option<&str> {
    manifest.get("name").and_then(Value::as_str)
}

/// `types`, `typings` and `main` entries in that order.
pub fn entry_points(manifest: &Value) -> Vec<String> {
    ["types", "typings", "main"]
        .iter()
        .filter_map(|k| manifest.get(*k).and_then(Value::as_str))
        .map(str::to_string)
        .collect()
}

/// Workspace globs from `workspaces: [...]` or `workspaces: { packages: [...] }`.
pub fn workspace_patterns(manifest: &Value) -> Vec<String> {
    let list = match manifest.get("workspaces") {
        Some(Value::Array(items)) => items,
        Some(Value::Object(map)) => match map.get("packages") {
            Some(Value::Array(items)) => items,
            _ => return Vec::new(),
        },
        _ => return Vec::new(),
    };
    list.iter()
        .filter_map(Value::as_str)
        .map(str::to_string)
        .collect()
}

/// Splits a bare specifier into package name and optional subpath:
/// `@scope/pkg/deep/file` ⇒ (`@scope/pkg`, `Some("deep/file")`).
pub fn split_bare_specifier(specifier: &str) -> (&str, Option<&str>) {
    let mut slashes = specifier.match_indices('/').map(|(i, _)| i);
    let cut = if specifier.starts_with('@') {
        slashes.nth(1)
    } else {
        slashes.next()
    };
    match cut {
        Some(i) => (&specifier[..i], Some(&specifier[i + 1..])),
        None => (specifier, None),
    }
}

/// `@types` directory name for a package: `@scope/pkg` ⇒ `scope__pkg`.
pub fn types_package_name(package: &str) -> String {
    match package.strip_prefix('@') {
        Some(scoped) => scoped.replacen('/', "__", 1),
        None => package.to_string(),
    }
}

/// Targets of `exports` for `subpath` (`"."` or `"./x"`), best first.
pub fn export_targets(exports: &Value, subpath: &str) -> Vec<String> {
    let mut out = Vec::new();
    let is_subpath_map = match exports {
        Value::Object(map) => map.keys().any(|k| k.starts_with('.')),
        _ => false,
    };
    if !is_subpath_map {
        if subpath == "." {
            collect_conditions(exports, &mut out);
        }
        return out;
    }
    let Value::Object(map) = exports else {
        return out;
    };
    if let Some(value) = map.get(subpath) {
        collect_conditions(value, &mut out);
        return out;
    }
    // Longest matching pattern key wins, as Node does.
    let mut best: Option<(&str, &Value, String)> = None;
    for (key, value) in map {
        let captured = if let Some((prefix, suffix)) = key.split_once('*') {
            subpath
                .strip_prefix(prefix)
                .and_then(|rest| rest.strip_suffix(suffix))
                .map(str::to_string)
        } else if key.ends_with('/') {
            subpath.strip_prefix(key.as_str()).map(str::to_string)
        } else {
            None
        };
        if let Some(captured) = captured {
            if best.as_ref().map(|(k, _, _)| key.len() > k.len()).unwrap_or(true) {
                best = Some((key.as_str(), value, captured));
            }
        }
    }
    if let Some((key, value, captured)) = best {
        let mut raw = Vec::new();
        collect_conditions(value, &mut raw);
        for target in raw {
            if key.contains('*') {
                out.push(target.replace('*', &captured));
            } else {
                out.push(format!("{}{}", target, captured));
            }
        }
    }
    out
}

fn collect_conditions(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::String(s) => {
            if !out.contains(s) {
                out.push(s.clone());
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_conditions(item, out);
            }
        }
        Value::Object(map) => {
            for condition in EXPORT_CONDITIONS {
                if let Some(inner) = map.get(*condition) {
                    collect_conditions(inner, out);
                }
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_export_conditions_priority() {
        let exports = json!({
            ".": { "default": "./dist/index.js", "import": "./dist/index.mjs", "types": "./dist/index.d.ts" },
            "./utils/*": { "types": "./dist/utils/*.d.ts" },
            "./package.json": "./package.json"
        });
        assert_eq!(
            export_targets(&exports, "."),
            vec!["./dist/index.d.ts", "./dist/index.mjs", "./dist/index.js"]
        );
        assert_eq!(
            export_targets(&exports, "./utils/strings"),
            vec!["./dist/utils/strings.d.ts"]
        );
        assert!(export_targets(&exports, "./missing").is_empty());
    }

    #[test]
    fn test_sugar_exports_apply_to_root_only() {
        let exports = json!({ "types": "./index.d.ts", "require": "./index.cjs" });
        assert_eq!(export_targets(&exports, "."), vec!["./index.d.ts", "./index.cjs"]);
        assert!(export_targets(&json!("./main.js"), "./sub").is_empty());
    }

    #[test]
    fn test_split_bare_specifier() {
        assert_eq!(split_bare_specifier("lodash"), ("lodash", None));
        assert_eq!(split_bare_specifier("lodash/fp/map"), ("lodash", Some("fp/map")));
        assert_eq!(split_bare_specifier("@scope/pkg"), ("@scope/pkg", None));
        assert_eq!(split_bare_specifier("@scope/pkg/x"), ("@scope/pkg", Some("x")));
        assert_eq!(types_package_name("@scope/pkg"), "scope__pkg");
    }

    #[test]
    fn test_workspace_patterns_both_shapes() {
        assert_eq!(workspace_patterns(&json!({ "workspaces": ["packages/*"] })), vec!["packages/*"]);
        assert_eq!(
            workspace_patterns(&json!({ "workspaces": { "packages": ["apps/*"] } })),
            vec!["apps/*"]
        );
    }
}
