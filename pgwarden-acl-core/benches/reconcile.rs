use criterion::{Criterion, black_box, criterion_group, criterion_main};
use pgwarden_acl_core::{GrantMatrix, Identifier, Privilege, PrivilegeSet, diff};

fn matrix(tables: usize, offset: usize) -> GrantMatrix {
    (0..tables)
        .map(|i| {
            let table = Identifier::parse(&format!("table_{}", i + offset)).expect("valid name");
            let privileges: PrivilegeSet = Privilege::ALL
                .into_iter()
                .enumerate()
                .filter(|(bit, _)| (i + offset) & (1 << bit) != 0)
                .map(|(_, p)| p)
                .collect();
            (table, privileges)
        })
        .collect()
}

fn bench_diff(c: &mut Criterion) {
    let current = matrix(500, 0);
    let desired = matrix(500, 250);
    let role = Identifier::parse("bench_role").expect("valid name");

    c.bench_function("diff_500_tables", |b| {
        b.iter(|| diff(black_box(&current), black_box(&desired)))
    });

    let plan = diff(&current, &desired);
    c.bench_function("render_statements_500_tables", |b| {
        b.iter(|| black_box(&plan).statements(black_box(&role)))
    });
}

criterion_group!(benches, bench_diff);
criterion_main!(benches);
