//! Project validation logic.
//!
//! Checks ids, references and value ranges. Topology rules that need the
//! assembled flowsheet (arity, single producer, nesting cycles, recycle order)
//! are checked when the project is compiled.

use std::collections::HashSet;

use crate::schema::{
    ConvergenceDef, ElementDef, FeedDef, MeasurementDef, Project, SearchMethodDef,
    SpecificationDef, UnitDef, UnitKindDef, VariableDef,
};

#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("Duplicate ID: {id} in {context}")]
    DuplicateId { id: String, context: String },

    #[error("Missing reference: {id} in {context}")]
    MissingReference { id: String, context: String },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

type Ids<'a> = HashSet<&'a str>;

struct Known<'a> {
    chemicals: Ids<'a>,
    streams: Ids<'a>,
    units: Ids<'a>,
    systems: Ids<'a>,
}

pub fn validate_project(project: &Project) -> Result<(), ValidationError> {
    if project.version == 0 || project.version > crate::LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: project.version,
        });
    }

    let known = Known {
        chemicals: unique_ids(project.chemicals.iter().map(|c| c.id.as_str()), "chemicals")?,
        streams: unique_ids(project.streams.iter().map(|s| s.id.as_str()), "streams")?,
        units: unique_ids(project.units.iter().map(|u| u.id.as_str()), "units")?,
        systems: unique_ids(project.systems.iter().map(|s| s.id.as_str()), "systems")?,
    };
    unique_ids(project.groups.iter().map(|g| g.id.as_str()), "groups")?;

    validate_convergence(&project.settings.convergence, "settings.convergence")?;
    if project.settings.max_depth == 0 {
        return Err(invalid("settings.max_depth", 0, "must be at least 1"));
    }

    for chem in &project.chemicals {
        if !(chem.molar_mass.is_finite() && chem.molar_mass > 0.0) {
            return Err(invalid(
                format!("chemical '{}' molar_mass", chem.id),
                chem.molar_mass,
                "must be positive",
            ));
        }
    }

    for stream in &project.streams {
        if let Some(feed) = &stream.feed {
            validate_feed(&stream.id, feed, &known)?;
        }
        if let Some(price) = stream.price {
            require_non_negative(format!("stream '{}' price", stream.id), price)?;
        }
    }

    for unit in &project.units {
        validate_unit(unit, &known)?;
    }

    for system in &project.systems {
        let context = format!("system '{}'", system.id);
        for element in system.path.iter().chain(&system.facilities) {
            let (id, pool) = match element {
                ElementDef::Unit(id) => (id, &known.units),
                ElementDef::System(id) => (id, &known.systems),
            };
            require(pool, id, &context)?;
        }
        for stream in system.recycles.iter().chain(&system.facility_recycle) {
            require(&known.streams, stream, &format!("{context} recycles"))?;
        }
        if let Some(conv) = &system.convergence {
            validate_convergence(conv, &format!("{context} convergence"))?;
        }
    }

    for group in &project.groups {
        for unit in &group.units {
            require(&known.units, unit, &format!("group '{}'", group.id))?;
        }
    }

    Ok(())
}

fn unique_ids<'a>(
    ids: impl Iterator<Item = &'a str>,
    context: &str,
) -> Result<Ids<'a>, ValidationError> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(ValidationError::DuplicateId {
                id: id.to_string(),
                context: context.to_string(),
            });
        }
    }
    Ok(seen)
}

fn require(pool: &Ids<'_>, id: &str, context: &str) -> Result<(), ValidationError> {
    if pool.contains(id) {
        Ok(())
    } else {
        Err(ValidationError::MissingReference {
            id: id.to_string(),
            context: context.to_string(),
        })
    }
}

fn invalid(field: impl Into<String>, value: impl ToString, reason: &str) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.into(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn require_non_negative(field: String, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(field, value, "must be finite and non-negative"))
    }
}

fn require_fraction(field: String, value: f64) -> Result<(), ValidationError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(invalid(field, value, "must be within [0, 1]"))
    }
}

fn require_positive(field: String, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, value, "must be positive"))
    }
}

fn validate_convergence(conv: &ConvergenceDef, context: &str) -> Result<(), ValidationError> {
    if conv.max_iterations == 0 {
        return Err(invalid(
            format!("{context}.max_iterations"),
            0,
            "must be at least 1",
        ));
    }
    require_non_negative(format!("{context}.molar_tolerance"), conv.molar_tolerance)?;
    require_non_negative(format!("{context}.relative_tolerance"), conv.relative_tolerance)?;
    require_non_negative(
        format!("{context}.temperature_tolerance"),
        conv.temperature_tolerance,
    )?;
    Ok(())
}

fn validate_feed(id: &str, feed: &FeedDef, known: &Known<'_>) -> Result<(), ValidationError> {
    let context = format!("stream '{id}' feed");
    for (chem, flow) in &feed.flows {
        require(&known.chemicals, chem, &context)?;
        require_non_negative(format!("{context} flow of {chem}"), *flow)?;
    }
    require_positive(format!("{context} temperature_k"), feed.temperature_k)?;
    require_positive(format!("{context} pressure_pa"), feed.pressure_pa)?;
    Ok(())
}

fn validate_unit(unit: &UnitDef, known: &Known<'_>) -> Result<(), ValidationError> {
    let context = format!("unit '{}'", unit.id);
    for stream in unit.ins.iter().chain(&unit.outs) {
        require(&known.streams, stream, &context)?;
    }

    match &unit.kind {
        UnitKindDef::Mixer | UnitKindDef::PassThrough => {}
        UnitKindDef::Splitter { split } => {
            require_fraction(format!("{context} split"), *split)?;
        }
        UnitKindDef::ComponentSplitter { splits } => {
            for (chem, split) in splits {
                require(&known.chemicals, chem, &context)?;
                require_fraction(format!("{context} split of {chem}"), *split)?;
            }
        }
        UnitKindDef::Heater { temperature_k, .. } => {
            require_positive(format!("{context} temperature_k"), *temperature_k)?;
        }
        UnitKindDef::Conversion {
            reactant,
            stoichiometry,
            conversion,
        } => {
            require(&known.chemicals, reactant, &context)?;
            for (chem, _) in stoichiometry {
                require(&known.chemicals, chem, &context)?;
            }
            require_fraction(format!("{context} conversion"), *conversion)?;
        }
        UnitKindDef::Flash {
            volatility,
            vapor_fraction,
        } => {
            for (chem, alpha) in volatility {
                require(&known.chemicals, chem, &context)?;
                require_non_negative(format!("{context} volatility of {chem}"), *alpha)?;
            }
            require_fraction(format!("{context} vapor_fraction"), *vapor_fraction)?;
        }
    }

    if let Some(spec) = &unit.specification {
        validate_specification(spec, known, &format!("{context} specification"))?;
    }
    Ok(())
}

fn validate_specification(
    spec: &SpecificationDef,
    known: &Known<'_>,
    context: &str,
) -> Result<(), ValidationError> {
    match spec {
        SpecificationDef::Fixed { variable, value } => {
            validate_variable(variable, known, context)?;
            if !value.is_finite() {
                return Err(invalid(format!("{context} value"), value, "must be finite"));
            }
        }
        SpecificationDef::Proportional {
            variable,
            measurement,
            factor,
        } => {
            validate_variable(variable, known, context)?;
            validate_measurement(measurement, known, context)?;
            if !factor.is_finite() {
                return Err(invalid(format!("{context} factor"), factor, "must be finite"));
            }
        }
        SpecificationDef::Search(search) => {
            validate_variable(&search.variable, known, context)?;
            validate_measurement(&search.measurement, known, context)?;
            if let Some(sub) = &search.subsystem {
                require(&known.systems, sub, context)?;
            }
            require_positive(format!("{context} xtol"), search.xtol)?;
            require_positive(format!("{context} ytol"), search.ytol)?;
            if search.max_iterations == 0 {
                return Err(invalid(
                    format!("{context} max_iterations"),
                    0,
                    "must be at least 1",
                ));
            }
            match &search.method {
                SearchMethodDef::Secant { x0, x1 } => {
                    if x0 == x1 {
                        return Err(invalid(format!("{context} x1"), x1, "must differ from x0"));
                    }
                }
                SearchMethodDef::SeededSecant { seed, step } => {
                    if !step.is_finite() || *step == 0.0 {
                        return Err(invalid(
                            format!("{context} step"),
                            step,
                            "must be finite and non-zero",
                        ));
                    }
                    if let Some(m) = seed {
                        validate_measurement(m, known, context)?;
                    }
                }
                SearchMethodDef::Bracketed { lower, upper, .. } => {
                    if !(lower < upper) {
                        return Err(invalid(
                            format!("{context} upper"),
                            upper,
                            "must exceed lower",
                        ));
                    }
                }
            }
        }
    }
    Ok(())
}

fn validate_variable(
    variable: &VariableDef,
    known: &Known<'_>,
    context: &str,
) -> Result<(), ValidationError> {
    match variable {
        VariableDef::UnitParameter { unit, .. } => require(&known.units, unit, context),
        VariableDef::FeedFlow { stream, chemical } => {
            require(&known.streams, stream, context)?;
            match chemical {
                Some(chem) => require(&known.chemicals, chem, context),
                None => Ok(()),
            }
        }
    }
}

fn validate_measurement(
    measurement: &MeasurementDef,
    known: &Known<'_>,
    context: &str,
) -> Result<(), ValidationError> {
    for stream in measurement.streams() {
        require(&known.streams, stream, context)?;
    }
    if let Some(chem) = measurement.chemical() {
        require(&known.chemicals, chem, context)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ChemicalDef, SettingsDef, StreamDef};

    fn project() -> Project {
        Project {
            version: crate::LATEST_VERSION,
            name: "t".into(),
            settings: SettingsDef::default(),
            chemicals: vec![ChemicalDef {
                id: "Water".into(),
                molar_mass: 18.015,
            }],
            streams: vec![StreamDef {
                id: "s1".into(),
                feed: None,
                price: None,
            }],
            units: vec![],
            systems: vec![],
            groups: vec![],
        }
    }

    #[test]
    fn minimal_project_is_valid() {
        validate_project(&project()).unwrap();
    }

    #[test]
    fn future_version_rejected() {
        let mut p = project();
        p.version = crate::LATEST_VERSION + 1;
        assert!(matches!(
            validate_project(&p),
            Err(ValidationError::UnsupportedVersion { .. })
        ));
    }

    #[test]
    fn duplicate_stream_rejected() {
        let mut p = project();
        p.streams.push(p.streams[0].clone());
        let err = validate_project(&p).unwrap_err();
        assert!(matches!(err, ValidationError::DuplicateId { ref id, .. } if id == "s1"));
    }

    #[test]
    fn zero_iteration_limit_rejected() {
        let mut p = project();
        p.settings.convergence.max_iterations = 0;
        assert!(matches!(
            validate_project(&p),
            Err(ValidationError::InvalidValue { .. })
        ));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn fraction_check_matches_unit_interval(v in -2.0_f64..3.0) {
            let ok = require_fraction("split".into(), v).is_ok();
            prop_assert_eq!(ok, (0.0..=1.0).contains(&v));
        }
    }
}
