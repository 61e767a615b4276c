use fiber_core::{create_element, Element, FiberRoot, MemoryHost, Props, Unbounded};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::time::Duration;

const SECTION_COUNT: usize = 4;
const ROWS_PER_SECTION: usize = 32;
const ROW_SAMPLES: &[usize] = &[8, 16, 32, 64];

fn table(sections: usize, rows_per_section: usize, generation: usize) -> Element {
    create_element(
        "main",
        Props::new().children_from((0..sections).map(|section| {
            create_element(
                "section",
                Props::new()
                    .with("id", format!("section-{section}"))
                    .child(format!("Section {section}"))
                    .children_from((0..rows_per_section).map(|row| {
                        create_element(
                            "div",
                            Props::new()
                                .with("class", "row")
                                .child(format!("Item {section}-{row}"))
                                .child(format!("gen {generation}")),
                        )
                    })),
            )
        })),
    )
}

fn fibers_per_table(sections: usize, rows_per_section: usize) -> usize {
    2 + sections * (2 + rows_per_section * 3)
}

struct Fixture {
    root: FiberRoot<MemoryHost>,
    sections: usize,
    rows_per_section: usize,
    generation: usize,
}

impl Fixture {
    fn new(sections: usize, rows_per_section: usize) -> Self {
        let (host, container) = MemoryHost::with_container("body").expect("container");
        let mut fixture = Self {
            root: FiberRoot::new(host, container),
            sections,
            rows_per_section,
            generation: 0,
        };
        fixture.render();
        fixture
    }

    fn render(&mut self) {
        self.root
            .render(table(self.sections, self.rows_per_section, self.generation));
        self.root.flush().expect("flush");
        self.root.host_mut().take_mutations();
    }
}

fn bench_unchanged_rerender(c: &mut Criterion) {
    let mut fixture = Fixture::new(SECTION_COUNT, ROWS_PER_SECTION);
    c.bench_function("rerender_unchanged", |b| {
        b.iter(|| {
            fixture.render();
            black_box(fixture.root.last_commit());
        });
    });
}

fn bench_text_updates(c: &mut Criterion) {
    let mut group = c.benchmark_group("rerender_text_update");
    for &rows in ROW_SAMPLES {
        group.bench_with_input(
            BenchmarkId::from_parameter(fibers_per_table(SECTION_COUNT, rows)),
            &rows,
            |b, &rows| {
                let mut fixture = Fixture::new(SECTION_COUNT, rows);
                b.iter(|| {
                    fixture.generation += 1;
                    fixture.render();
                    black_box(fixture.root.last_commit());
                });
            },
        );
    }
    group.finish();
}

fn bench_sliced_first_render(c: &mut Criterion) {
    let slice = || Duration::ZERO;
    c.bench_function("first_render_one_unit_slices", |b| {
        b.iter(|| {
            let (host, container) = MemoryHost::with_container("body").expect("container");
            let mut root = FiberRoot::new(host, container);
            root.render(table(SECTION_COUNT, ROWS_PER_SECTION, 0));
            while root.has_pending_work() {
                root.work_loop(&slice).expect("slice");
            }
            root.work_loop(&Unbounded).expect("idle");
            black_box(root.tree().len());
        });
    });
}

criterion_group!(
    reconcile,
    bench_unchanged_rerender,
    bench_text_updates,
    bench_sliced_first_render
);
criterion_main!(reconcile);
