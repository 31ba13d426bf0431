use criterion::{black_box, criterion_group, criterion_main, Criterion};
use roimask::{
    compute_roi_labels, compute_vertex_correspondence, Affine, BrainMesh, CorticalSurface, RegionSet, RoiLabelOptions,
    ValidVertex, ValidVertexMap, VolumeGrid,
};

fn hemisphere(center_x: f32, n: usize) -> BrainMesh {
    let golden = std::f32::consts::PI * (3.0 - 5.0_f32.sqrt());
    let points: Vec<[f32; 3]> = (0..n)
        .map(|i| {
            let y = 1.0 - 2.0 * (i as f32 + 0.5) / n as f32;
            let r = (1.0 - y * y).sqrt();
            let theta = golden * i as f32;
            [center_x + 60.0 * r * theta.cos(), 70.0 * y, 55.0 * r * theta.sin()]
        })
        .collect();
    BrainMesh::from_points(&points)
}

fn brain() -> (CorticalSurface, RegionSet) {
    let lh = hemisphere(-40.0, 50_000);
    let rh = hemisphere(40.0, 50_000);
    let xfm = Affine::scale_translate([0.4, 0.4, 0.4], [40.0, 40.0, 32.0]).unwrap();
    let grid = VolumeGrid::new([64, 80, 80], xfm).unwrap();
    let surface = CorticalSurface::from_hemispheres(&lh, &rh, grid).unwrap();

    let mut regions = RegionSet::new(ValidVertexMap::identity(surface.num_vertices()));
    for r in 0..8 {
        let verts: Vec<ValidVertex> = (r * 10_000..r * 10_000 + 6_000).map(ValidVertex).collect();
        regions.add_region(format!("roi{}", r), &verts).unwrap();
    }
    (surface, regions)
}

fn bench_labels(c: &mut Criterion) {
    let (surface, regions) = brain();
    let opts = RoiLabelOptions::default().with_cortical_distance(3.0);

    let mut group = c.benchmark_group("roimask");
    group.sample_size(10);
    group.bench_function("vertex_correspondence", |b| {
        b.iter(|| compute_vertex_correspondence(black_box(&surface)).unwrap())
    });
    group.bench_function("roi_labels", |b| {
        b.iter(|| compute_roi_labels(black_box(&surface), black_box(&regions), &opts).unwrap())
    });
    group.finish();
}

criterion_group!(benches, bench_labels);
criterion_main!(benches);
