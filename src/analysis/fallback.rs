//! Rule-based substitute for the provider-generated analysis, used when
//! the upstream call fails. Pure function of its inputs; branch selection
//! follows fixed moisture and pump-usage thresholds.

use crate::models::{PumpUsage, Statistics, Trend};

/// Build the structured multi-section report. Never panics for finite
/// numeric input; identical inputs produce identical output.
pub fn generate_fallback_report(
    stats: &Statistics,
    pump: &PumpUsage,
    total_readings: usize,
) -> String {
    let mut report = String::new();

    report.push_str("# ANALISIS OTOMATIS SISTEM IRIGASI\n\n");
    report.push_str("_Analisis ini dihasilkan oleh algoritma lokal karena layanan AI tidak tersedia._\n\n");

    report.push_str("## 1. Status Kesehatan Tanah\n\n");
    report.push_str(&soil_health_section(stats));

    report.push_str("## 2. Analisis Pola & Tren\n\n");
    report.push_str(&trend_section(stats));

    report.push_str("## 3. Efisiensi Pompa\n\n");
    report.push_str(&pump_section(pump));

    report.push_str("## 4. Rekomendasi Tindakan\n\n");
    report.push_str(&recommendation_section(stats));

    report.push_str("## 5. Informasi Sistem\n\n");
    report.push_str(
        "Mode analisis: algoritma lokal berbasis statistik dan aturan ambang batas, \
         tanpa koneksi ke layanan AI. Hasil tetap memadai untuk evaluasi dasar \
         sistem irigasi.\n\n",
    );

    report.push_str("---\n\n");
    report.push_str(&format!("_Total {total_readings} data points dianalisis_\n"));

    report
}

/// Soil-health label: >=70 very good, >=50 good, >=30 adequate,
/// otherwise needs attention.
fn soil_health_label(mean: f64) -> &'static str {
    if mean >= 70.0 {
        "SANGAT BAIK"
    } else if mean >= 50.0 {
        "BAIK"
    } else if mean >= 30.0 {
        "CUKUP"
    } else {
        "PERLU PERHATIAN"
    }
}

fn soil_health_section(stats: &Statistics) -> String {
    let label = soil_health_label(stats.mean);
    let guidance = match label {
        "SANGAT BAIK" => {
            "Tanah memiliki kadar air yang sangat optimal untuk mendukung pertumbuhan tanaman."
        }
        "BAIK" => "Kelembaban tanah dalam kondisi baik, cukup dengan monitoring berkala.",
        "CUKUP" => {
            "Kelembaban masih dalam batas wajar namun perlu perhatian. \
             Pertimbangkan peningkatan frekuensi penyiraman."
        }
        _ => {
            "Kelembaban relatif rendah. Sistem perlu segera ditingkatkan \
             untuk mencegah kekeringan tanah."
        }
    };
    format!(
        "**Status: {label}**\n\nKelembaban rata-rata {:.1}%. {guidance}\n\n",
        stats.mean
    )
}

fn trend_section(stats: &Statistics) -> String {
    let explanation = match stats.trend {
        Trend::Meningkat => {
            "Tren menunjukkan peningkatan kelembaban: sistem irigasi bekerja efektif \
             atau curah hujan meningkat."
        }
        Trend::Menurun => {
            "Tren menunjukkan penurunan kelembaban: periksa apakah pompa bekerja \
             optimal atau suhu lingkungan meningkat."
        }
        Trend::Stabil => {
            "Kelembaban stabil: keseimbangan baik antara penyiraman dan penguapan."
        }
    };
    format!(
        "- Tren kelembaban: {}\n- Range kelembaban: {:.0}% - {:.0}%\n- Variasi: {:.1}%\n\n{explanation}\n\n",
        stats.trend,
        stats.min,
        stats.max,
        stats.max - stats.min,
    )
}

/// Pump-efficiency label: >50% too frequent, >30% optimal, >10% acceptable,
/// otherwise rare.
fn pump_efficiency_label(percentage: f64) -> &'static str {
    if percentage > 50.0 {
        "terlalu sering"
    } else if percentage > 30.0 {
        "optimal"
    } else if percentage > 10.0 {
        "cukup baik"
    } else {
        "jarang"
    }
}

fn pump_section(pump: &PumpUsage) -> String {
    let label = pump_efficiency_label(pump.percentage);
    let guidance = match label {
        "terlalu sering" => {
            "Pompa terlalu sering aktif (>50%): pertimbangkan menaikkan threshold \
             minimum kelembaban, periksa kebocoran, dan evaluasi kapasitas pompa."
        }
        "optimal" => "Frekuensi aktivasi pompa optimal (30-50%).",
        "cukup baik" => "Frekuensi aktivasi pompa cukup baik (10-30%).",
        _ => {
            "Pompa jarang aktif (<10%): periksa apakah kelembaban alami sudah cukup, \
             sensor bekerja dengan baik, dan threshold tidak terlalu rendah."
        }
    };
    format!(
        "- Aktivasi pompa: {} kali ({:.1}%)\n- Evaluasi: frekuensi {label}\n\n{guidance}\n\n",
        pump.activations, pump.percentage,
    )
}

fn recommendation_section(stats: &Statistics) -> String {
    let mut section = String::from("### Jangka Pendek (1-7 hari):\n");
    if stats.mean < 40.0 {
        section.push_str("- PRIORITAS: tingkatkan frekuensi penyiraman\n");
        section.push_str("- Monitoring intensif setiap 6 jam\n");
        section.push_str("- Pertimbangkan penyiraman manual tambahan\n\n");
    } else {
        section.push_str("- Pertahankan jadwal monitoring rutin\n");
        section.push_str("- Observasi tren kelembaban harian\n");
        section.push_str("- Catat perubahan cuaca eksternal\n\n");
    }
    section.push_str("### Jangka Panjang:\n");
    section.push_str("- Integrasi sensor cuaca untuk optimasi otomatis\n");
    section.push_str("- Backup sistem pompa untuk redundansi\n");
    section.push_str("- Analisis data bulanan untuk pola musiman\n\n");
    section
}
