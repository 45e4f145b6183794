use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use proptab::{is_tautology, parse_prop_formula, Formula, Tableau};

const SMALL: &str = "((P->Q)&P)->Q";
const MEDIUM: &str = "(((P->(Q->R))&((P->Q)&P))->((R|S)&(~S->R)))";
const LARGE: &str = "((((A|B)&(C|D))&((E|F)&(~A|~C)))->(((B|D)|(A&C))|(((E&~F)|(F&~E))|(E&F))))";
const PIGEON: &str = "~(((A|B)&(C|D))&((E|F)&((~A|~C)&((~A|~E)&((~C|~E)&((~B|~D)&((~B|~F)&(~D|~F))))))))";

pub fn parser(c: &mut Criterion) {
    let mut g = c.benchmark_group("Parser");
    for (name, f) in [("small", SMALL), ("medium", MEDIUM), ("large", LARGE)] {
        g.bench_with_input(BenchmarkId::new("Parser", name), &f, |b, &f| {
            b.iter(|| {
                let n = parse_prop_formula(f).unwrap();
                black_box(n)
            })
        });
    }
    g.finish();
}

pub fn tautology(c: &mut Criterion) {
    let mut g = c.benchmark_group("Tautology");
    for (name, f) in [
        ("small", SMALL),
        ("medium", MEDIUM),
        ("large", LARGE),
        ("pigeonhole", PIGEON),
    ] {
        g.bench_with_input(BenchmarkId::new("Tautology", name), &f, |b, &f| {
            b.iter(|| black_box(is_tautology(f)))
        });
    }
    g.finish();
}

pub fn tableau_only(c: &mut Criterion) {
    let mut g = c.benchmark_group("Tableau");
    g.bench_with_input(BenchmarkId::new("Tableau", "pigeonhole"), &PIGEON, |b, &f| {
        let n = parse_prop_formula(f).unwrap();
        b.iter(|| {
            let mut t = Tableau::new(vec![Formula::not(n.clone())]);
            black_box(t.run())
        })
    });
    g.finish();
}

criterion_group!(benches, parser, tautology, tableau_only);
criterion_main!(benches);
