mod common;

use common::{write_series, SeriesSpec};
use prostate_berry::prelude::*;
use prostate_berry::volume::{read_single_series, scan_series};

fn t2w_value(r: usize, c: usize, z: usize) -> u16 {
    (100 * z + 10 * r + c) as u16
}

#[test]
fn test_read_single_series_orders_slices() {
    let temp = tempfile::tempdir().unwrap();
    let dir = temp.path().join("T2W");
    let spec = SeriesSpec {
        uid: "1.2.826.0.1.3680043.9.1",
        number: 3,
        shape: (3, 4, 5),
    };
    write_series(&dir, &spec, t2w_value);

    let (v, meta) = read_single_series(&dir, false).unwrap();
    assert_eq!(v.dim(), (3, 4, 5));
    assert_eq!(meta.shape, (3, 4, 5));
    assert_eq!(meta.number, Some(3));
    assert_eq!(meta.pixel_spacing, [0.5, 0.75]);
    assert!(common::f64_eq(meta.slice_spacing, 2.5, 1e-9));
    for ((r, c, z), x) in v.indexed_iter() {
        assert_eq!(*x, t2w_value(r, c, z) as f64);
    }

    // 翻转: 第 0 层不动, 其余逆序.
    let (rv, _) = read_single_series(&dir, true).unwrap();
    assert_eq!(rv[(1, 2, 0)], v[(1, 2, 0)]);
    assert_eq!(rv[(1, 2, 1)], v[(1, 2, 4)]);
    assert_eq!(rv[(1, 2, 4)], v[(1, 2, 1)]);
}

#[test]
fn test_standalone_modality_from_dicom() {
    let temp = tempfile::tempdir().unwrap();
    let dir = temp.path().join("T2W");
    let spec = SeriesSpec {
        uid: "1.2.826.0.1.3680043.9.2",
        number: 1,
        shape: (4, 4, 3),
    };
    write_series(&dir, &spec, t2w_value);

    let mut t2w = StandaloneModality::t2w().with_path(dir.as_path());
    assert!(!t2w.is_read());
    t2w.read_data_from_path(None).unwrap();
    assert!(t2w.is_read());
    assert!(t2w.path_state().is_loaded());
    assert_eq!(t2w.min(), Some(0.0));
    assert_eq!(t2w.max(), Some(t2w_value(3, 3, 2) as f64));
}

#[test]
fn test_multi_series_directory() {
    let temp = tempfile::tempdir().unwrap();
    let dir = temp.path().join("DCE");
    for (i, uid) in ["1.2.826.0.1.3680043.9.11", "1.2.826.0.1.3680043.9.10"]
        .iter()
        .enumerate()
    {
        let spec = SeriesSpec {
            uid,
            // 第二个写入的序列编号更小, 读取后应排在前面.
            number: 2 - i as i32,
            shape: (2, 3, 2),
        };
        let sub = temp.path().join(format!("s{i}"));
        write_series(&sub, &spec, move |r, c, z| (1000 * i + 10 * r + c + z) as u16);
        for entry in std::fs::read_dir(&sub).unwrap() {
            let p = entry.unwrap().path();
            std::fs::create_dir_all(&dir).unwrap();
            let name = format!("{i}_{}", p.file_name().unwrap().to_string_lossy());
            std::fs::rename(&p, dir.join(name)).unwrap();
        }
    }

    let series = scan_series(&dir).unwrap();
    assert_eq!(series.len(), 2);
    assert_eq!(series[0].number, Some(1));
    assert_eq!(series[1].number, Some(2));

    let e = read_single_series(&dir, false).unwrap_err();
    assert_eq!(
        e.as_validation(),
        Some(&ValidationError::NotSingleSeries {
            path: dir.clone(),
            found: 2
        })
    );

    // 单序列模态拒绝多序列目录, 且状态不变.
    let mut t2w = StandaloneModality::t2w();
    assert!(t2w.read_data_from_path(Some(dir.clone().into())).is_err());
    assert!(!t2w.is_read());
    assert!(t2w.path_data().is_none());

    let mut dce = MultisequenceModality::new(ModalityKind::Dce).unwrap();
    dce.read_data_from_path(Some(dir.into())).unwrap();
    assert_eq!(dce.n_series(), 2);
    // 编号为 1 的序列是第二个写入的.
    assert_eq!(dce.series(0).unwrap()[(0, 0, 0)], 1000.0);
    assert_eq!(dce.series(1).unwrap()[(0, 0, 0)], 0.0);
    assert_eq!(dce.range(), Some((0.0, 1000.0 + 10.0 + 2.0 + 1.0)));
}

#[test]
fn test_ground_truth_from_sub_directories() {
    let temp = tempfile::tempdir().unwrap();
    let root = temp.path().join("GT");
    let shape = (4, 4, 2);
    let pz = SeriesSpec {
        uid: "1.2.826.0.1.3680043.9.20",
        number: 1,
        shape,
    };
    let prostate = SeriesSpec {
        uid: "1.2.826.0.1.3680043.9.21",
        number: 1,
        shape,
    };
    // 子目录按名称排序: `a_prostate`, `b_pz`.
    write_series(&root.join("a_prostate"), &prostate, |r, _, _| if r < 2 { 255 } else { 0 });
    write_series(&root.join("b_pz"), &pz, |r, c, _| if r == 0 && c == 0 { 1 } else { 0 });

    let mut gt_mod = GtModality::new().with_path(root.as_path());
    let e = gt_mod.read_data_from_path(&[PROSTATE], None).unwrap_err();
    assert_eq!(
        e.as_validation(),
        Some(&ValidationError::LabelCountMismatch {
            labels: 1,
            series: 2
        })
    );
    assert!(!gt_mod.is_read());

    gt_mod.read_data_from_path(&[PROSTATE, PZ], None).unwrap();
    assert_eq!(gt_mod.n_series(), 2);
    assert_eq!(gt_mod.category_labels(), &[PROSTATE.to_string(), PZ.to_string()]);

    let idx = gt_mod
        .extract_gt_data(PZ, OutputType::Index)
        .unwrap()
        .into_index()
        .unwrap();
    assert_eq!(idx, [vec![0, 0], vec![0, 0], vec![0, 1]]);

    let data = gt_mod
        .extract_gt_data(PROSTATE, OutputType::Data)
        .unwrap()
        .into_data()
        .unwrap();
    assert_eq!(data.iter().filter(|v| **v).count(), 2 * 4 * 2);
    assert!(gt_mod.extract_gt_data(CG, OutputType::Data).is_err());
}

#[test]
fn test_ground_truth_from_path_list() {
    let temp = tempfile::tempdir().unwrap();
    let shape = (2, 2, 2);
    let a = temp.path().join("cap");
    let b = temp.path().join("cg");
    let spec_a = SeriesSpec {
        uid: "1.2.826.0.1.3680043.9.30",
        number: 1,
        shape,
    };
    let spec_b = SeriesSpec {
        uid: "1.2.826.0.1.3680043.9.31",
        number: 1,
        shape,
    };
    write_series(&a, &spec_a, |_, _, z| z as u16);
    write_series(&b, &spec_b, |_, _, _| 0);

    let mut gt_mod = GtModality::new();
    gt_mod
        .read_data_from_path(&[CAP, CG], Some(PathData::list([&a, &b])))
        .unwrap();
    assert_eq!(gt_mod.mask(CAP).unwrap().iter().filter(|v| **v).count(), 4);
    assert_eq!(gt_mod.mask(CG).unwrap().iter().filter(|v| **v).count(), 0);

    let missing = PathData::list([a.as_path(), temp.path().join("none").as_path()]);
    let mut other = GtModality::new();
    let e = other.read_data_from_path(&[CAP, CG], Some(missing)).unwrap_err();
    assert!(matches!(
        e.as_validation(),
        Some(ValidationError::PathNotFound(_))
    ));
}
