//! Change products persisted through a [`RasterEngine`]
//!
//! Each product builds its classification in memory first, checks that the
//! classification covers every code present in the input raster, and only
//! then asks the engine to write anything. If any engine step fails after
//! that point the output dataset is removed before the error is returned, so
//! a failed run never leaves a partial product behind. An output handle that
//! names one of the product's inputs is rejected before anything is removed.

use covershift_core::table::{COUNT_FIELD, VALUE_FIELD};
use covershift_core::{
    AttributeTable, CategoryRegistry, Error, FrequencyTable, RasterEngine, Result, StatRow,
    TimeSlice,
};
use tracing::{debug, info, warn};

use super::collapse::{collapse_classification, CollapseParams, CHANGE_TYPE_FIELD, RECLASS_FIELD};
use super::labels::Labels;
use super::six_class::{six_class_classification, ChangeClass, SixClassParams};
use super::stats::{compute_labeled_stats, StatsParams};
use super::transition::{transition_table_from_registry, TransitionTable};

/// Result of [`change_product`]
#[derive(Debug, Clone)]
pub struct ChangeProduct {
    /// Full cross product of both classifications; its encoder produced the
    /// combined raster
    pub transitions: TransitionTable,
    /// One row per combined code present in the output raster
    pub stats: Vec<StatRow>,
}

/// Statistics parameters using the engine's cell area for `raster`
pub fn engine_stats_params<E: RasterEngine>(engine: &E, raster: &E::Handle) -> Result<StatsParams> {
    let params = StatsParams {
        cell_area_m2: engine.cell_area(raster)?,
    };
    params.validate()?;
    Ok(params)
}

/// Combine two classifications into a change raster with a labeled attribute
/// table.
///
/// Output columns: `Value, Count, start_class, start_class_name, end_class,
/// end_class_name, change_type, area_ha, perc_total`.
pub fn change_product<E: RasterEngine>(
    engine: &mut E,
    start: &E::Handle,
    end: &E::Handle,
    output: &E::Handle,
    params: StatsParams,
) -> Result<ChangeProduct> {
    check_output_distinct(output, &[start, end])?;
    params.validate()?;
    let mut registry = CategoryRegistry::new();
    for c in engine.categories(start, TimeSlice::Start)? {
        registry.insert(c)?;
    }
    for c in engine.categories(end, TimeSlice::End)? {
        registry.insert(c)?;
    }
    let transitions = transition_table_from_registry(&registry)?;
    debug!(
        "{} start x {} end categories, {} transitions, base {}",
        registry.len(TimeSlice::Start),
        registry.len(TimeSlice::End),
        transitions.len(),
        transitions.encoder().base()
    );

    info!("Combining {:?} and {:?} into {:?}", start, end, output);
    let stats = with_cleanup(engine, output, |engine| {
        engine.combine(start, end, transitions.encoder(), output)?;
        let freq = engine.frequency_table(output)?;
        check_coverage(&freq, &transitions)?;

        let stats = compute_labeled_stats(&freq, params, None, &transitions)?;
        let mut table = AttributeTable::new();
        for s in &stats {
            let t = transitions.lookup(s.value)?;
            table.set(s.value, COUNT_FIELD, s.pixel_count as i64);
            table.set(s.value, "start_class", t.start.value);
            table.set(s.value, "start_class_name", t.start.name.as_str());
            table.set(s.value, "end_class", t.end.value);
            table.set(s.value, "end_class_name", t.end.name.as_str());
            table.set(s.value, CHANGE_TYPE_FIELD, t.change_type.as_str());
            table.set(s.value, "area_ha", s.area_ha);
            table.set(s.value, "perc_total", s.percent_of_total);
        }
        engine.write_table(&table, output)?;
        Ok(stats)
    })?;

    Ok(ChangeProduct { transitions, stats })
}

/// Reclassify a change raster into the six outcome classes.
///
/// Output columns: `Value, Count, class, area_ha, perc_of_subset`, where the
/// subset is outcome classes 1 to 3 (the start set's area in time 1).
pub fn six_class_product<E: RasterEngine>(
    engine: &mut E,
    change: &E::Handle,
    transitions: &TransitionTable,
    params: &SixClassParams,
    stats: StatsParams,
    output: &E::Handle,
) -> Result<Vec<StatRow>> {
    check_output_distinct(output, &[change])?;
    stats.validate()?;
    let classification =
        six_class_classification(transitions.codes(), transitions.encoder(), params)?;
    let freq = engine.frequency_table(change)?;
    check_coverage(&freq, &classification)?;

    info!(
        "Six-class summary of {:?}: {} to {} into {:?}",
        change, params.start_name, params.end_name, output
    );
    with_cleanup(engine, output, |engine| {
        engine.apply_reclass(change, &classification.reclass_map(), output)?;
        let out_freq = engine.frequency_table(output)?;
        debug!("{} outcome classes present", out_freq.len());

        let in_start_set =
            |v: i64| ChangeClass::from_code(v).is_some_and(ChangeClass::in_start_set);
        let rows = compute_labeled_stats(
            &out_freq,
            stats,
            Some(&in_start_set),
            classification.outcome_labels(),
        )?;

        let mut table = AttributeTable::new();
        for r in &rows {
            table.set(r.value, COUNT_FIELD, r.pixel_count as i64);
            table.set(r.value, "class", r.label.as_str());
            table.set(r.value, "area_ha", r.area_ha);
            if let Some(p) = r.percent_of_subset {
                table.set(r.value, "perc_of_subset", p);
            }
        }
        engine.write_table(&table, output)?;
        Ok(rows)
    })
}

/// Reclassify a change raster around one target class.
///
/// The collapsed label is joined onto the output by collapsed code, then the
/// table gets `area_ha` and `perc_area`.
pub fn collapse_product<E: RasterEngine>(
    engine: &mut E,
    change: &E::Handle,
    transitions: &TransitionTable,
    params: &CollapseParams,
    stats: StatsParams,
    output: &E::Handle,
) -> Result<Vec<StatRow>> {
    check_output_distinct(output, &[change])?;
    stats.validate()?;
    let join = collapse_classification(transitions, params)?;
    let freq = engine.frequency_table(change)?;
    check_coverage(&freq, &join)?;

    info!(
        "Collapsing {:?} around {} into {:?}",
        change, params.target_name, output
    );
    with_cleanup(engine, output, |engine| {
        engine.apply_reclass(change, &join.reclass_map(), output)?;
        engine.join_fields(
            output,
            VALUE_FIELD,
            &join.to_attribute_table(),
            RECLASS_FIELD,
            &[CHANGE_TYPE_FIELD],
        )?;

        let out_freq = engine.frequency_table(output)?;
        let rows = compute_labeled_stats(&out_freq, stats, None, join.collapsed_labels())?;

        let mut table = engine.attribute_table(output)?;
        for r in &rows {
            table.set(r.value, "area_ha", r.area_ha);
            table.set(r.value, "perc_area", r.percent_of_total);
        }
        engine.write_table(&table, output)?;
        Ok(rows)
    })
}

/// Persist statistics rows as a standalone summary table.
///
/// Columns: `Value, label, Count, area_ha, perc_total`, plus
/// `perc_of_subset` for rows inside the subset.
pub fn summary_table_product<E: RasterEngine>(
    engine: &mut E,
    rows: &[StatRow],
    output: &E::Handle,
) -> Result<()> {
    info!("Writing {} summary rows to {:?}", rows.len(), output);
    with_cleanup(engine, output, |engine| engine.write_stats(rows, output))
}

/// `output` must not name any of `inputs`, since a stale output is removed
/// before the product runs
fn check_output_distinct<H>(output: &H, inputs: &[&H]) -> Result<()>
where
    H: PartialEq + std::fmt::Debug,
{
    if inputs.iter().any(|&input| input == output) {
        return Err(Error::InvalidParameter {
            name: "output",
            value: format!("{:?}", output),
            reason: "output must differ from every input dataset".into(),
        });
    }
    Ok(())
}

/// Every code of `freq` must have an entry in `labels`
fn check_coverage(freq: &FrequencyTable, labels: &dyn Labels) -> Result<()> {
    for code in freq.codes() {
        labels.require(code)?;
    }
    Ok(())
}

/// Run `step`, removing `output` if it fails.
///
/// A stale `output` from an earlier failed run is removed first, so nothing
/// it contains is ever reused.
fn with_cleanup<E, T>(
    engine: &mut E,
    output: &E::Handle,
    step: impl FnOnce(&mut E) -> Result<T>,
) -> Result<T>
where
    E: RasterEngine,
{
    if engine.exists(output) {
        info!("Replacing existing {:?}", output);
        engine.remove(output)?;
    }

    match step(engine) {
        Ok(v) => Ok(v),
        Err(err) => {
            if engine.exists(output) {
                warn!("Removing partial output {:?} after error: {}", output, err);
                if let Err(e) = engine.remove(output) {
                    warn!("Could not remove {:?}: {}", output, e);
                }
            }
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::MemoryEngine;
    use covershift_core::{CategoryEntry, FieldValue, GeoTransform, Raster};

    fn legend() -> Vec<CategoryEntry> {
        [(2, "Developed"), (4, "Natural"), (7, "Water"), (9, "Other")]
            .iter()
            .map(|&(value, name)| CategoryEntry {
                value,
                name: name.into(),
            })
            .collect()
    }

    fn raster(values: Vec<i32>) -> Raster<i32> {
        let mut r = Raster::from_vec(values, 2, 3).unwrap();
        r.set_transform(GeoTransform::new(0.0, 60.0, 30.0, -30.0));
        r
    }

    fn engine() -> MemoryEngine {
        let mut e = MemoryEngine::new();
        e.add_classification("t1", raster(vec![4, 4, 4, 4, 9, 2]), &legend())
            .unwrap();
        e.add_classification("t2", raster(vec![4, 2, 9, 4, 4, 4]), &legend())
            .unwrap();
        e
    }

    #[test]
    fn test_change_product_table() {
        let mut e = engine();
        let params = engine_stats_params(&e, &"t1".to_string()).unwrap();
        let p = change_product(&mut e, &"t1".into(), &"t2".into(), &"chg".into(), params).unwrap();

        assert_eq!(p.transitions.len(), 16);
        let t = e.attribute_table(&"chg".into()).unwrap();
        assert_eq!(t.len(), 5);
        assert_eq!(
            t.get(402, CHANGE_TYPE_FIELD).and_then(FieldValue::as_text),
            Some("Natural to Developed")
        );
        assert_eq!(
            t.get(404, CHANGE_TYPE_FIELD).and_then(FieldValue::as_text),
            Some("No change")
        );
        assert_eq!(t.get(404, COUNT_FIELD), Some(&FieldValue::Int(2)));
        assert_eq!(t.get(904, "start_class_name").and_then(FieldValue::as_text), Some("Other"));
    }

    #[test]
    fn test_failed_product_leaves_no_output() {
        let mut e = engine();
        let p = change_product(
            &mut e,
            &"t1".into(),
            &"t2".into(),
            &"chg".into(),
            StatsParams::default(),
        )
        .unwrap();

        // Water never occurs in time 1, so the percent-of-subset denominator
        // is zero once the reclassified raster exists.
        let params = SixClassParams::new([7], "Water", [2], "Developed", false);
        let err = six_class_product(
            &mut e,
            &"chg".into(),
            &p.transitions,
            &params,
            StatsParams::default(),
            &"out".into(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::ZeroDenominator { .. }));
        assert!(!e.exists(&"out".into()));
        assert!(e.exists(&"chg".into()));
    }

    #[test]
    fn test_output_naming_an_input_is_rejected() {
        let mut e = engine();
        let err = change_product(
            &mut e,
            &"t1".into(),
            &"t2".into(),
            &"t2".into(),
            StatsParams::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidParameter { name: "output", .. }));
        assert!(e.exists(&"t2".into()));
        assert!(e.raster("t2").is_some());
    }

    #[test]
    fn test_summary_table_columns() {
        let mut e = engine();
        let rows = vec![StatRow {
            value: 1,
            label: "Natural in both time periods".into(),
            pixel_count: 2,
            area_ha: 0.18,
            percent_of_total: 40.0,
            percent_of_subset: Some(50.0),
        }];
        summary_table_product(&mut e, &rows, &"summary".into()).unwrap();

        let t = e.attribute_table(&"summary".into()).unwrap();
        assert_eq!(t.get(1, COUNT_FIELD), Some(&FieldValue::Int(2)));
        assert_eq!(
            t.get(1, "label").and_then(FieldValue::as_text),
            Some("Natural in both time periods")
        );
        assert_eq!(t.get(1, "perc_of_subset"), Some(&FieldValue::Float(50.0)));
        assert!(e.raster("summary").is_none());
    }
}
