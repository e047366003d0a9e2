//! 集成测试共用的数据构造工具.

#![allow(dead_code)]

use std::path::Path;

use dicom::core::{DataElement, PrimitiveValue, Tag, VR};
use dicom::dictionary_std::{tags, uids};
use dicom::object::{FileMetaTableBuilder, InMemDicomObject};

const MR_IMAGE_STORAGE: &str = "1.2.840.10008.5.1.4.1.1.4";

/// 一个合成序列的描述.
pub struct SeriesSpec<'a> {
    /// `SeriesInstanceUID`.
    pub uid: &'a str,
    /// `SeriesNumber`.
    pub number: i32,
    /// `(行, 列, 切片)`.
    pub shape: (usize, usize, usize),
}

fn str_elem(tag: Tag, vr: VR, s: &str) -> DataElement<InMemDicomObject> {
    DataElement::new(tag, vr, PrimitiveValue::from(s))
}

fn multi_str_elem(tag: Tag, vr: VR, v: &[String]) -> DataElement<InMemDicomObject> {
    DataElement::new(tag, vr, PrimitiveValue::Strs(v.iter().cloned().collect()))
}

fn us_elem(tag: Tag, v: u16) -> DataElement<InMemDicomObject> {
    DataElement::new(tag, VR::US, PrimitiveValue::from(v))
}

/// 在 `dir` 中写出一个 DICOM 序列, 体素 `(r, c, z)` 的值为 `value(r, c, z)`.
///
/// 文件名与切片位置顺序相反, 实例号也被打乱, 用于检查切片排序.
pub fn write_series<F: Fn(usize, usize, usize) -> u16>(
    dir: &Path,
    spec: &SeriesSpec<'_>,
    value: F,
) {
    std::fs::create_dir_all(dir).unwrap();
    let (rows, cols, slices) = spec.shape;
    for z in 0..slices {
        let sop_uid = format!("{}.{}", spec.uid, z + 1);
        let mut obj = InMemDicomObject::new_empty();
        obj.put(str_elem(tags::SOP_CLASS_UID, VR::UI, MR_IMAGE_STORAGE));
        obj.put(str_elem(tags::SOP_INSTANCE_UID, VR::UI, &sop_uid));
        obj.put(str_elem(tags::MODALITY, VR::CS, "MR"));
        obj.put(str_elem(tags::SERIES_INSTANCE_UID, VR::UI, spec.uid));
        obj.put(str_elem(tags::SERIES_NUMBER, VR::IS, &spec.number.to_string()));
        obj.put(str_elem(
            tags::INSTANCE_NUMBER,
            VR::IS,
            &((z * 7) % slices + 1).to_string(),
        ));
        let position = ["0".to_string(), "0".to_string(), format!("{}", z as f64 * 2.5)];
        obj.put(multi_str_elem(tags::IMAGE_POSITION_PATIENT, VR::DS, &position));
        let orientation: Vec<String> = ["1", "0", "0", "0", "1", "0"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        obj.put(multi_str_elem(tags::IMAGE_ORIENTATION_PATIENT, VR::DS, &orientation));
        obj.put(multi_str_elem(
            tags::PIXEL_SPACING,
            VR::DS,
            &["0.5".to_string(), "0.75".to_string()],
        ));
        obj.put(str_elem(tags::SLICE_THICKNESS, VR::DS, "2.5"));

        obj.put(us_elem(tags::ROWS, rows as u16));
        obj.put(us_elem(tags::COLUMNS, cols as u16));
        obj.put(us_elem(tags::SAMPLES_PER_PIXEL, 1));
        obj.put(str_elem(tags::PHOTOMETRIC_INTERPRETATION, VR::CS, "MONOCHROME2"));
        obj.put(us_elem(tags::BITS_ALLOCATED, 16));
        obj.put(us_elem(tags::BITS_STORED, 16));
        obj.put(us_elem(tags::HIGH_BIT, 15));
        obj.put(us_elem(tags::PIXEL_REPRESENTATION, 0));

        let pixels: Vec<u16> = (0..rows)
            .flat_map(|r| (0..cols).map(move |c| (r, c)))
            .map(|(r, c)| value(r, c, z))
            .collect();
        obj.put(DataElement::new(
            tags::PIXEL_DATA,
            VR::OW,
            PrimitiveValue::U16(pixels.into_iter().collect()),
        ));

        let meta = FileMetaTableBuilder::new()
            .transfer_syntax(uids::EXPLICIT_VR_LITTLE_ENDIAN)
            .media_storage_sop_class_uid(MR_IMAGE_STORAGE)
            .media_storage_sop_instance_uid(sop_uid.as_str());
        let file = obj.with_meta(meta).unwrap();
        // 文件名顺序与切片位置相反.
        file.write_to_file(dir.join(format!("IM{:04}.dcm", slices - z)))
            .unwrap();
    }
}

/// 浮点近似相等.
pub fn f64_eq(a: f64, b: f64, eps: f64) -> bool {
    (a - b).abs() < eps
}
