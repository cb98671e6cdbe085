// src/sheets/mappings.rs

/// Sheet header → canonical field name.
const HEADER_MAP: [(&str, &str); 10] = [
    ("วัน/เดือน/ปี", "date"),
    ("ชื่อผู้กรอกข้อมูล", "submitted_by"),
    ("ชั้นที่", "floor"),
    ("ขยะทั่วไป (กิโลกรัม)", "general_waste_kg"),
    ("ขยะอินทรีย์ (กิโลกรัม) (ทำปุ๋ย)", "organic_waste_kg"),
    ("ขยะรีไซเคิล (กิโลกรัม)", "recycle_waste_kg"),
    ("ขยะอันตราย (กิโลกรัม)", "hazardous_waste_kg"),
    ("รวมขยะทั้งหมด (กก)", "total_waste_kg"),
    ("รวมขยะฝังกลบ (กก)", "landfill_waste_kg"),
    ("Carbon emission (kgCO2e/kg)", "carbon_emission_kgco2e"),
];

/// Unmapped headers come back unchanged.
pub fn canonical_name(header: &str) -> &str {
    HEADER_MAP
        .iter()
        .find(|(source, _)| *source == header)
        .map(|(_, canonical)| *canonical)
        .unwrap_or(header)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_known_headers() {
        assert_eq!(canonical_name("วัน/เดือน/ปี"), "date");
        assert_eq!(canonical_name("Carbon emission (kgCO2e/kg)"), "carbon_emission_kgco2e");
    }

    #[test]
    fn passes_unknown_headers_through() {
        assert_eq!(canonical_name("หมายเหตุ"), "หมายเหตุ");
        assert_eq!(canonical_name("date"), "date");
    }
}
