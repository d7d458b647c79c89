//! Hallucinated-dependency detection.
//!
//! Walks every recognized manifest, verifies each declared package against
//! its ecosystem registry, and compares names against the top-package list.
//! A 404 is a phantom package; network trouble other than 404 is logged and
//! the dependency is skipped without an alert.

use chrono::Utc;
use tracing::debug;

use crate::alert::{Alert, RuleId};
use crate::config::Config;
use crate::manifest::{parse_manifest_str, Dependency};
use crate::registry::PackageSource;

use super::{read_source, RuleContext, RuleModule, TopPackages};

pub struct HallucinationModule;

impl RuleModule for HallucinationModule {
    fn name(&self) -> &'static str {
        "hallucination"
    }

    fn is_enabled(&self, config: &Config) -> bool {
        config.modules.hallucination
    }

    fn analyze(&self, ctx: &RuleContext, alerts: &mut Vec<Alert>) -> anyhow::Result<()> {
        for record in ctx.files.iter().filter(|f| f.is_manifest) {
            if ctx.cancel.is_cancelled() {
                break;
            }

            let Some(content) = read_source(record) else {
                continue;
            };
            let deps = parse_manifest_str(&record.path, &content);

            for dep in &deps {
                if ctx.cancel.is_cancelled() {
                    break;
                }
                check_dependency(ctx, record.relative.as_str(), dep, alerts);
            }
        }

        Ok(())
    }
}

fn check_dependency(ctx: &RuleContext, manifest: &str, dep: &Dependency, alerts: &mut Vec<Alert>) {
    // Existence first; a phantom package short-circuits every other check.
    match ctx.registry.exists(dep.registry, &dep.name) {
        Ok(false) => {
            alerts.push(
                Alert::new(
                    RuleId::PhantomPackage,
                    manifest,
                    format!(
                        "package \"{}\" does not exist on {}",
                        dep.name, dep.registry
                    ),
                )
                .with_suggestion("remove the dependency or fix the package name"),
            );
            return;
        }
        Ok(true) => {}
        Err(e) => {
            debug!("registry lookup failed for {}: {}", dep.name, e);
            return;
        }
    }

    if ctx.config.supply_chain.check_newborn {
        check_newborn(ctx.registry, ctx.config, manifest, dep, alerts);
    }

    check_typosquat(ctx.top_packages, ctx.config, manifest, dep, alerts);
}

fn check_newborn(
    registry: &dyn PackageSource,
    config: &Config,
    manifest: &str,
    dep: &Dependency,
    alerts: &mut Vec<Alert>,
) {
    let info = match registry.info(dep.registry, &dep.name) {
        Ok(Some(info)) => info,
        Ok(None) => return,
        Err(e) => {
            debug!("registry info failed for {}: {}", dep.name, e);
            return;
        }
    };

    let threshold = i64::from(config.hallucination.package_age_threshold_days);
    let age = info.age_days(Utc::now());
    if age < threshold {
        alerts.push(
            Alert::new(
                RuleId::NewbornPackage,
                manifest,
                format!(
                    "package \"{}\" was first published {} day(s) ago (threshold {})",
                    dep.name, age, threshold
                ),
            )
            .with_suggestion("verify the package is legitimate before depending on it"),
        );
    }
}

fn check_typosquat(
    top_packages: &TopPackages,
    config: &Config,
    manifest: &str,
    dep: &Dependency,
    alerts: &mut Vec<Alert>,
) {
    // A name that is itself a top package is trusted, not a squat of its
    // neighbors.
    if top_packages.contains(&dep.name) {
        return;
    }

    let distance = config.hallucination.typosquat_levenshtein_distance;
    if let Some(target) = top_packages.near_match(&dep.name, distance) {
        alerts.push(
            Alert::new(
                RuleId::TyposquatRisk,
                manifest,
                format!(
                    "package \"{}\" is {} edit(s) away from popular package \"{}\"",
                    dep.name, distance, target
                ),
            )
            .with_suggestion(format!("did you mean \"{}\"?", target)),
        );
    }
}
