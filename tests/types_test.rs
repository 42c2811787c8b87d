use vr_video_sync::types::{BoundingBox, CropRegion};

#[test]
fn test_bbox_from_anchor() {
    let b = BoundingBox::from_anchor(10, 20, 15, 15);
    assert_eq!((b.x1, b.y1, b.x2, b.y2), (10, 20, 25, 35));
    assert_eq!((b.width(), b.height()), (15, 15));
    assert_eq!((b.cx, b.cy), (17.5, 27.5));
}

#[test]
fn test_crop_region_parse() {
    let crop: CropRegion = "10, 5, 60, 25".parse().unwrap();
    assert_eq!(crop.top_left(), (10, 5));
    assert_eq!(crop.bottom_right(), (60, 25));
    assert_eq!((crop.width(), crop.height()), (50, 20));

    // corners in any order
    let swapped: CropRegion = "60,25,10,5".parse().unwrap();
    assert_eq!(swapped, crop);

    assert!("1,2,3".parse::<CropRegion>().is_err());
    assert!("1,2,3,x".parse::<CropRegion>().is_err());
    assert!("-1,2,3,4".parse::<CropRegion>().is_err());
}

#[test]
fn test_crop_region_clamp() {
    let crop = CropRegion::from_corners((90, 50), (200, 200));
    let clamped = crop.clamp_to(100, 80);
    assert_eq!(clamped, CropRegion::from_corners((90, 50), (100, 80)));
    assert!(CropRegion::from_corners((150, 10), (160, 20)).clamp_to(100, 80).is_empty());
}

#[test]
fn test_crop_region_union_per_axis() {
    let wide = CropRegion::from_corners((10, 10), (60, 20));
    let tall = CropRegion::from_corners((10, 10), (30, 40));
    assert_eq!(wide.union(&tall), CropRegion::from_corners((10, 10), (60, 40)));

    let empty = CropRegion::from_corners((10, 10), (10, 10));
    assert_eq!(empty.union(&tall), tall);
    assert_eq!(wide.union(&empty), wide);
    assert!(empty.union(&empty).is_empty());
}
