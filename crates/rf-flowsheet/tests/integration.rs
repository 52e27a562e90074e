//! Integration tests for rf-flowsheet: assembly rules, ordering, accounting.

use rf_flowsheet::accounting::{system_feeds, system_products};
use rf_flowsheet::ordering::{analyze, topological_order};
use rf_flowsheet::{
    Accounting, ControlVariable, Element, FlowsheetBuilder, FlowsheetError, Measurement,
    SearchMethod, SearchSpec, Specification, SystemDef,
};
use rf_stream::Stream;
use rf_units::{Heater, Mixer, PassThrough, Splitter};

struct Loop {
    builder: FlowsheetBuilder,
    feed: rf_core::StreamId,
    product: rf_core::StreamId,
    recycle: rf_core::StreamId,
    mixer: rf_core::UnitId,
    splitter: rf_core::UnitId,
}

/// feed -> M1 -> S1 -> product, S1 -> recycle -> M1
fn recycle_loop() -> Loop {
    let mut b = FlowsheetBuilder::new("loop");
    b.add_chemicals(&[("Water", 18.015), ("Ethanol", 46.07)]).unwrap();
    let feed = b.add_feed(
        "feed",
        Stream::from_flows(vec![90.0, 10.0]).unwrap().with_price(0.5),
    );
    let mixed = b.add_stream("mixed");
    let product = b.add_stream("product");
    let recycle = b.add_stream("recycle");
    let mixer = b.add_unit("M1", Mixer::new(), &[feed, recycle], &[mixed]);
    let splitter = b.add_unit(
        "S1",
        Splitter::uniform(0.7).unwrap(),
        &[mixed],
        &[product, recycle],
    );
    Loop {
        builder: b,
        feed,
        product,
        recycle,
        mixer,
        splitter,
    }
}

#[test]
fn back_edge_without_recycle_is_rejected() {
    let Loop {
        mut builder,
        mixer,
        splitter,
        ..
    } = recycle_loop();
    builder.add_system(
        SystemDef::new("sys").with_path(vec![Element::Unit(mixer), Element::Unit(splitter)]),
    );
    let err = builder.build().unwrap_err();
    assert!(matches!(err, FlowsheetError::UnclosedBackEdge { .. }), "{err}");
}

#[test]
fn back_edge_inside_recycle_system_is_accepted() {
    let Loop {
        mut builder,
        recycle,
        mixer,
        splitter,
        ..
    } = recycle_loop();
    let edge = builder.recycle(recycle).unwrap();
    let sys = builder.add_system(
        SystemDef::new("sys")
            .with_path(vec![Element::Unit(mixer), Element::Unit(splitter)])
            .with_recycle(edge),
    );
    let fs = builder.build().unwrap();

    let order = analyze(&fs, sys).unwrap();
    assert_eq!(order.units, vec![mixer, splitter]);
    assert_eq!(order.back_edges.len(), 1);
    assert_eq!(order.back_edges[0].stream, recycle);
    assert!(topological_order(&fs, &order.units).is_err());
}

#[test]
fn recycle_consumer_after_producer_is_rejected() {
    let Loop {
        mut builder,
        recycle,
        mixer,
        splitter,
        ..
    } = recycle_loop();
    let edge = builder.recycle(recycle).unwrap();
    // Listing the splitter first makes `mixed` the back edge and `recycle` forward.
    builder.add_system(
        SystemDef::new("sys")
            .with_path(vec![Element::Unit(splitter), Element::Unit(mixer)])
            .with_recycle(edge),
    );
    assert!(matches!(
        builder.build(),
        Err(FlowsheetError::InvalidRecycle { .. })
    ));
}

#[test]
fn topological_order_of_straight_line() {
    let mut b = FlowsheetBuilder::new("line");
    b.add_chemical("Water", 18.015).unwrap();
    let feed = b.add_feed("feed", Stream::from_flows(vec![5.0]).unwrap());
    let s1 = b.add_stream("s1");
    let s2 = b.add_stream("s2");
    let h1 = b.add_unit("H1", Heater::new(320.0).unwrap(), &[feed], &[s1]);
    let h2 = b.add_unit("H2", Heater::new(340.0).unwrap(), &[s1], &[s2]);
    let fs = b.build().unwrap();
    assert_eq!(topological_order(&fs, &[h2, h1]).unwrap(), vec![h1, h2]);
}

#[test]
fn nesting_cycle_is_rejected() {
    let mut b = FlowsheetBuilder::new("nest");
    let a = rf_core::SystemId::from_index(0);
    let c = rf_core::SystemId::from_index(1);
    b.add_system(SystemDef::new("a").with_path(vec![Element::System(c)]));
    b.add_system(SystemDef::new("c").with_path(vec![Element::System(a)]));
    assert!(matches!(
        b.build(),
        Err(FlowsheetError::NestingCycle { .. })
    ));
}

#[test]
fn unit_listed_twice_is_rejected() {
    let Loop {
        mut builder,
        recycle,
        mixer,
        splitter,
        ..
    } = recycle_loop();
    let edge = builder.recycle(recycle).unwrap();
    let inner = builder.add_system(SystemDef::new("inner").with_path(vec![Element::Unit(mixer)]));
    builder.add_system(
        SystemDef::new("outer")
            .with_path(vec![
                Element::System(inner),
                Element::Unit(mixer),
                Element::Unit(splitter),
            ])
            .with_recycle(edge),
    );
    assert!(matches!(
        builder.build(),
        Err(FlowsheetError::DuplicateUnitInPath { .. })
    ));
}

#[test]
fn search_subsystem_must_not_contain_owner() {
    let Loop {
        mut builder,
        product,
        recycle,
        mixer,
        splitter,
        ..
    } = recycle_loop();
    let edge = builder.recycle(recycle).unwrap();
    let sys = builder.add_system(
        SystemDef::new("sys")
            .with_path(vec![Element::Unit(mixer), Element::Unit(splitter)])
            .with_recycle(edge),
    );
    let search = SearchSpec::new(
        ControlVariable::UnitParameter {
            unit: splitter,
            parameter: "split".into(),
        },
        Measurement::TotalFlow { stream: product },
        50.0,
        SearchMethod::Bracketed {
            lower: 0.0,
            upper: 1.0,
            check_bounds: true,
        },
    )
    .with_subsystem(sys);
    builder
        .set_specification(splitter, Specification::Search(search))
        .unwrap();
    let err = builder.build().unwrap_err();
    assert!(matches!(err, FlowsheetError::InvalidSpecification { .. }), "{err}");
}

#[test]
fn specification_parameter_must_exist() {
    let Loop {
        mut builder,
        mixer,
        ..
    } = recycle_loop();
    builder
        .set_specification(
            mixer,
            Specification::Fixed {
                variable: ControlVariable::UnitParameter {
                    unit: mixer,
                    parameter: "split".into(),
                },
                value: 0.5,
            },
        )
        .unwrap();
    assert!(matches!(
        builder.build(),
        Err(FlowsheetError::InvalidSpecification { .. })
    ));
}

#[test]
fn feed_flow_variable_and_measurements() {
    let Loop {
        builder,
        feed,
        product,
        splitter,
        ..
    } = recycle_loop();
    let mut fs = builder.build().unwrap();
    let ethanol = fs.chemicals().require("Ethanol").unwrap();

    let total = ControlVariable::FeedFlow {
        stream: feed,
        chemical: None,
    };
    assert_eq!(total.get(&fs).unwrap(), 100.0);
    total.set(&mut fs, 200.0).unwrap();
    assert!((fs.stream(feed).unwrap().flow(ethanol) - 20.0).abs() < 1e-12);

    let split = ControlVariable::UnitParameter {
        unit: splitter,
        parameter: "split".into(),
    };
    split.set(&mut fs, 0.25).unwrap();
    assert_eq!(split.get(&fs).unwrap(), 0.25);
    assert!(split.set(&mut fs, 2.0).is_err());

    let frac = Measurement::MoleFraction {
        stream: feed,
        chemical: ethanol,
    };
    assert!((frac.measure(&fs).unwrap() - 0.1).abs() < 1e-12);
    let ratio = Measurement::MassRatio {
        numerator: feed,
        denominator: product,
        chemical: None,
    };
    assert_eq!(ratio.measure(&fs).unwrap(), 0.0);
}

#[test]
fn run_unit_and_reset() {
    let Loop {
        builder,
        feed,
        mixer,
        ..
    } = recycle_loop();
    let mut fs = builder.build().unwrap();
    let mixed = fs.stream_id("mixed").unwrap();

    fs.run_unit(mixer).unwrap();
    assert_eq!(fs.stream(mixed).unwrap().total_flow(), 100.0);

    fs.reset_streams().unwrap();
    assert_eq!(fs.stream(mixed).unwrap().total_flow(), 0.0);
    assert_eq!(fs.stream(feed).unwrap().total_flow(), 100.0);
}

#[test]
fn accounting_excludes_subsystem_streams() {
    // main: feed -> P1 -> mid -> H1 -> product; chp: fuel -> B1 -> ash
    let mut b = FlowsheetBuilder::new("plant");
    b.add_chemical("Water", 18.015).unwrap();
    let feed = b.add_feed("feed", Stream::from_flows(vec![10.0]).unwrap().with_price(1.0));
    let fuel = b.add_feed("fuel", Stream::from_flows(vec![2.0]).unwrap().with_price(3.0));
    let mid = b.add_stream("mid");
    let product = b.add_stream("product");
    b.add_stream("spare");
    let ash = b.add_stream("ash");
    let p1 = b.add_unit("P1", PassThrough, &[feed], &[mid]);
    let h1 = b.add_unit("H1", Heater::new(350.0).unwrap(), &[mid], &[product]);
    let b1 = b.add_unit("B1", PassThrough, &[fuel], &[ash]);
    b.tag_unit(h1, "utility").unwrap();
    let chp = b.add_system(SystemDef::new("chp").with_path(vec![Element::Unit(b1)]));
    let plant = b.add_system(
        SystemDef::new("plant")
            .with_path(vec![Element::Unit(p1), Element::Unit(h1)])
            .with_facilities(vec![Element::System(chp)]),
    );
    b.add_group("heating", &[h1]);
    let fs = b.build().unwrap();

    assert_eq!(system_feeds(&fs, plant).unwrap(), vec![feed, fuel]);
    assert_eq!(system_products(&fs, plant).unwrap(), vec![product, ash]);

    let full = Accounting::new(&fs, plant).unwrap();
    let water_mw = 18.015;
    assert!((full.feed_cost_rate() - (10.0 + 6.0) * water_mw).abs() < 1e-9);

    let tea = Accounting::new(&fs, plant)
        .unwrap()
        .excluding_system(chp)
        .unwrap();
    assert_eq!(tea.feeds(), &[feed]);
    assert_eq!(tea.products(), &[product]);
    assert_eq!(tea.units().collect::<Vec<_>>(), vec![p1, h1]);
    assert!((tea.feed_cost_rate() - 10.0 * water_mw).abs() < 1e-9);
    assert_eq!(tea.product_revenue_rate(), 0.0);

    // H1 makes the plant's product; dropping it by tag drops the product too.
    let untagged = tea.excluding_tag("utility");
    assert_eq!(untagged.units().collect::<Vec<_>>(), vec![p1]);
    assert_eq!(untagged.feeds(), &[feed]);
    assert!(untagged.products().is_empty());

    let group = fs.group(fs.group_id("heating").unwrap()).unwrap();
    assert_eq!(group.units, vec![h1]);
}

#[test]
fn tagged_facility_unit_drops_its_feeds_and_products() {
    // main: feed -> P1 -> product; facility CHP (tagged): fuel -> ash
    let mut b = FlowsheetBuilder::new("plant");
    b.add_chemical("Water", 18.015).unwrap();
    let feed = b.add_feed("feed", Stream::from_flows(vec![10.0]).unwrap().with_price(1.0));
    let fuel = b.add_feed("fuel", Stream::from_flows(vec![4.0]).unwrap().with_price(4.0));
    let product = b.add_stream("product");
    let ash = b.add_stream("ash");
    let p1 = b.add_unit("P1", PassThrough, &[feed], &[product]);
    let chp = b.add_unit("CHP", PassThrough, &[fuel], &[ash]);
    b.tag_unit(chp, "chp").unwrap();
    let plant = b.add_system(
        SystemDef::new("plant")
            .with_path(vec![Element::Unit(p1)])
            .with_facilities(vec![Element::Unit(chp)]),
    );
    let fs = b.build().unwrap();
    let water_mw = 18.015;

    let full = Accounting::new(&fs, plant).unwrap();
    assert_eq!(full.feeds(), &[feed, fuel]);
    assert!((full.feed_cost_rate() - 26.0 * water_mw).abs() < 1e-9);

    let by_tag = Accounting::new(&fs, plant).unwrap().excluding_tag("chp");
    assert_eq!(by_tag.feeds(), &[feed]);
    assert_eq!(by_tag.products(), &[product]);
    assert!((by_tag.feed_cost_rate() - 10.0 * water_mw).abs() < 1e-9);

    let by_unit = Accounting::new(&fs, plant).unwrap().excluding_units(&[chp]);
    assert_eq!(by_unit.feeds(), by_tag.feeds());
    assert_eq!(by_unit.products(), by_tag.products());
    assert_eq!(by_unit.units().collect::<Vec<_>>(), vec![p1]);

    // The graph itself is untouched
    assert_eq!(system_feeds(&fs, plant).unwrap(), vec![feed, fuel]);
}
