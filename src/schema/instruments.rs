//! Static definitions of the twelve supported instruments.

use super::{
    BlockGrouping, FieldShape, FileNaming, HeaderBoundaries, HeaderField, HeaderKind,
    HeaderOverride, InstrumentSchema, ObsField, RowLayout, SeriesColumn, SubSeries, ValueKind,
};
use ValueKind::{Code, Float, Integer, OptionalTimestamp, Text, Timestamp};

const TIME_UNIT: &str = "yyyy-mm-dd hh:mm:ss";

const STATION_CODES: [&str; 12] = [
    "Station_name",
    "Country",
    "Province",
    "City",
    "County",
    "Station_ID",
    "LAT",
    "LON",
    "ALT",
    "Station_type",
    "Station_level",
    "Admi_code_CHN",
];

const TRAILING_CODES: [&str; 4] = ["Obse_begi_DT", "Obse_end_DT", "Data_crea_DT", "Dataset_version"];

fn header_field(code: &'static str) -> HeaderField {
    use HeaderKind as K;
    let (long_name, unit, kind) = match code {
        "Station_name" => ("Station name", "-", K::Text),
        "Country" => ("Country", "-", K::Text),
        "Province" => ("Province", "-", K::Text),
        "City" => ("City", "-", K::Text),
        "County" => ("County", "-", K::Text),
        "Station_ID" => ("Station identifier", "-", K::Text),
        "LAT" => ("Latitude", "degree", K::Float),
        "LON" => ("Longitude", "degree", K::Float),
        "ALT" => ("Altitude", "m", K::Float),
        "Station_type" => ("Station type", "-", K::Text),
        "Station_level" => ("Station level", "-", K::Text),
        "Admi_code_CHN" => ("Administrative division code", "-", K::Text),
        "Mete_data_code" => ("Meteorological data code", "-", K::Text),
        "Manufacturer_model" => ("Manufacturer and model", "-", K::Text),
        "Software_version" => ("Software version", "-", K::Text),
        "Service_version" => ("Service software version", "-", K::Text),
        "Device_version" => ("Device firmware version", "-", K::Text),
        "Devi_seri_numb" => ("Device serial number", "-", K::Text),
        "Pres_sens_HGT" => ("Height of pressure sensor", "m", K::Float),
        "Temp_RH_sens_HGT" => ("Height of temperature and humidity sensor", "m", K::Float),
        "Wind_sens_HGT" => ("Height of wind sensor", "m", K::Float),
        "AERM_sens_HGT" => ("Height of particulate matter sensor", "m", K::Float),
        "VIS_sens_HGT" => ("Height of visibility sensor", "m", K::Float),
        "YCCL_sens_HGT" => ("Height of ceilometer", "m", K::Float),
        "RSD_sens_HGT" => ("Height of disdrometer", "m", K::Float),
        "MRD_sens_HGT" => ("Height of microwave radiometer", "m", K::Float),
        "FSD_sens_HGT" => ("Height of fog droplet spectrometer", "m", K::Float),
        "Prec_sens_HGT" => ("Height of rain gauge", "m", K::Float),
        "RRD_sens_HGT" => ("Height of micro rain radar", "m", K::Float),
        "Bandwidth" => ("Bandwidth", "Hz", K::Float),
        "Calibration_constant" => ("Calibration constant", "-", K::Float),
        "MMR_data_qual" => ("Micro rain radar data quality", "-", K::Integer),
        "Time_AVG" => ("Averaging time", "s", K::Integer),
        "Sampling_rate" => ("Sampling rate", "Hz", K::Float),
        "Data_level" | "Date_level" => ("Data level", "-", K::Text),
        "Timezone" => ("Time zone", "-", K::Text),
        "Time_resolution" => ("Time resolution", "s", K::Integer),
        "Numb_part_diam_clas" => ("Number of particle diameter classes", "-", K::Integer),
        "Numb_part_velo_clas" => ("Number of particle velocity classes", "-", K::Integer),
        "Part_diam_clas" => ("Particle diameter classes", "mm", K::FloatArray),
        "Part_velo_clas" => ("Particle velocity classes", "m/s", K::FloatArray),
        "HGT" => ("Height levels", "m", K::FloatArray),
        "Sample_area" => ("Sample area", "mm2", K::Float),
        "Channel_count" => ("Channel count", "-", K::Integer),
        "Size_each_bin" => ("Upper size of each bin", "um", K::IntArray),
        "Obse_begi_DT" => ("Observation begin time", TIME_UNIT, K::Text),
        "Obse_end_DT" => ("Observation end time", TIME_UNIT, K::Text),
        "Data_crea_DT" => ("Data creation time", TIME_UNIT, K::Text),
        "Dataset_version" => ("Dataset version", "-", K::Text),
        _ => (code, "-", K::Text),
    };
    HeaderField {
        code,
        long_name,
        unit,
        kind,
    }
}

/// Station codes, the instrument-specific middle, then the trailing time codes.
fn header(middle: &[&'static str]) -> Vec<HeaderField> {
    STATION_CODES
        .iter()
        .chain(middle)
        .chain(TRAILING_CODES.iter())
        .copied()
        .map(header_field)
        .collect()
}

fn boundaries(instrument_end: usize) -> HeaderBoundaries {
    HeaderBoundaries {
        station_end: 11,
        instrument_end,
    }
}

const fn naming(
    class01: &'static str,
    data_code: &'static str,
    manufacturer: &'static str,
    level: &'static str,
    quality_controlled: bool,
) -> FileNaming {
    FileNaming {
        class01,
        class03: "MOBS",
        class04: "SUOB",
        station: "LSYW",
        data_code,
        manufacturer,
        level,
        quality_controlled,
    }
}

const DATETIME: ObsField = ObsField::scalar("Datetime", "Datetime", TIME_UNIT, Timestamp);

fn qc(code: &'static str, long_name: &'static str) -> ObsField {
    ObsField::scalar(code, long_name, "-", Integer)
}

pub(super) fn all() -> Vec<InstrumentSchema> {
    vec![
        aws(),
        aerm(),
        vis(),
        yccl_l3(),
        yccl_l2(),
        rsd(),
        mrd(),
        fsd(),
        pre(),
        rrd_lraw(),
        rrd_processed("RRD_Lpro", "Lpro", "Micro rain radar, reprocessed"),
        rrd_processed("RRD_Lave", "Lave", "Micro rain radar, averaged"),
    ]
}

fn aws() -> InstrumentSchema {
    InstrumentSchema {
        id: "AWS",
        description: "Automatic weather station",
        header_fields: header(&[
            "Mete_data_code",
            "Manufacturer_model",
            "Software_version",
            "Pres_sens_HGT",
            "Temp_RH_sens_HGT",
            "Wind_sens_HGT",
            "Data_level",
            "Timezone",
            "Time_resolution",
        ]),
        boundaries: boundaries(17),
        obs_fields: vec![
            DATETIME,
            ObsField::scalar("Pres", "Air pressure", "hPa", Float),
            qc("Q_Pres", "Quality control code of air pressure"),
            ObsField::scalar("Temp", "Air temperature", "degC", Float),
            qc("Q_Temp", "Quality control code of air temperature"),
            ObsField::scalar("RH", "Relative humidity", "%", Float),
            qc("Q_RH", "Quality control code of relative humidity"),
            ObsField::scalar("Wind_dire", "Wind direction", "degree", Float),
            qc("Q_Wind_dire", "Quality control code of wind direction"),
            ObsField::scalar("Wind_velo", "Wind speed", "m/s", Float),
            qc("Q_Wind_velo", "Quality control code of wind speed"),
            ObsField::scalar("Prec", "Precipitation", "mm", Float),
            qc("Q_Prec", "Quality control code of precipitation"),
        ],
        primary_timestamp: "Datetime",
        layout: RowLayout::Columnar,
        grouping: BlockGrouping::None,
        naming: naming("SURF", "AWS", "HY", "LX", true),
        overrides: vec![],
    }
}

fn aerm() -> InstrumentSchema {
    InstrumentSchema {
        id: "AERM",
        description: "Particulate matter monitor",
        header_fields: header(&[
            "Mete_data_code",
            "Manufacturer_model",
            "Software_version",
            "AERM_sens_HGT",
            "Data_level",
            "Timezone",
            "Time_resolution",
        ]),
        boundaries: boundaries(15),
        obs_fields: vec![
            DATETIME,
            ObsField::scalar("PM1", "PM1 mass concentration", "ug/m3", Float),
            qc("Q_PM1", "Quality control code of PM1"),
            ObsField::scalar("PM2_5", "PM2.5 mass concentration", "ug/m3", Float),
            qc("Q_PM2_5", "Quality control code of PM2.5"),
            ObsField::scalar("PM10", "PM10 mass concentration", "ug/m3", Float),
            qc("Q_PM10", "Quality control code of PM10"),
        ],
        primary_timestamp: "Datetime",
        layout: RowLayout::Columnar,
        grouping: BlockGrouping::None,
        naming: naming("SURF", "AERM", "THER", "LX", true),
        overrides: vec![HeaderOverride::FastCadence {
            code: "Time_resolution",
            max_gap_secs: 10,
            value: "6",
        }],
    }
}

fn vis() -> InstrumentSchema {
    InstrumentSchema {
        id: "VIS",
        description: "Visibility sensor",
        header_fields: header(&[
            "Mete_data_code",
            "Manufacturer_model",
            "Software_version",
            "VIS_sens_HGT",
            "Data_level",
            "Timezone",
            "Time_resolution",
        ]),
        boundaries: boundaries(15),
        obs_fields: vec![
            DATETIME,
            ObsField::scalar("VIS_1MIN", "1-minute average visibility", "m", Float),
            qc("Q_VIS_1MIN", "Quality control code of 1-minute visibility"),
            ObsField::scalar("VIS_10MIN", "10-minute average visibility", "m", Float),
            qc("Q_VIS_10MIN", "Quality control code of 10-minute visibility"),
        ],
        primary_timestamp: "Datetime",
        layout: RowLayout::Columnar,
        grouping: BlockGrouping::None,
        naming: naming("SURF", "VIS", "VAIS", "LX", true),
        overrides: vec![],
    }
}

fn yccl_l3() -> InstrumentSchema {
    InstrumentSchema {
        id: "YCCL_L3",
        description: "Ceilometer, level 3 cloud products",
        header_fields: header(&[
            "Mete_data_code",
            "Manufacturer_model",
            "Software_version",
            "YCCL_sens_HGT",
            "Data_level",
            "Timezone",
            "Time_resolution",
        ]),
        boundaries: boundaries(15),
        obs_fields: vec![
            DATETIME,
            ObsField::scalar("Cloud_base_HGT_1", "Lowest cloud base height", "m", Float),
            ObsField::scalar("Cloud_base_HGT_2", "Second cloud base height", "m", Float),
            ObsField::scalar("Cloud_base_HGT_3", "Third cloud base height", "m", Float),
            ObsField::scalar("Vert_VIS", "Vertical visibility", "m", Float),
            qc("Q_data", "Quality control code"),
        ],
        primary_timestamp: "Datetime",
        layout: RowLayout::Columnar,
        grouping: BlockGrouping::None,
        naming: naming("UPAR", "YCCL", "VAIS", "L3", false),
        overrides: vec![],
    }
}

fn yccl_l2() -> InstrumentSchema {
    InstrumentSchema {
        id: "YCCL_L2",
        description: "Ceilometer, level 2 backscatter profiles",
        header_fields: header(&[
            "Mete_data_code",
            "Manufacturer_model",
            "Software_version",
            "YCCL_sens_HGT",
            "Date_level",
            "Timezone",
            "Time_resolution",
        ]),
        boundaries: boundaries(15),
        obs_fields: vec![
            DATETIME,
            ObsField::scalar("Cloud_detec_stat", "Cloud detection status", "-", Integer),
            ObsField::scalar("Window_trans", "Window transmission", "%", Float),
            ObsField::scalar("Laser_puls_ener", "Laser pulse energy", "%", Float),
            ObsField::array(
                "BS_prof",
                "Backscatter profile",
                "1/(srad*km)",
                Integer,
                FieldShape::Vector(450),
                &["Dime_bs_prof"],
            ),
            qc("Q_BS_prof", "Quality control code of backscatter profile"),
        ],
        primary_timestamp: "Datetime",
        layout: RowLayout::Columnar,
        grouping: BlockGrouping::FixedVector,
        naming: naming("UPAR", "YCCL", "VAIS", "L2", false),
        overrides: vec![],
    }
}

fn rsd() -> InstrumentSchema {
    InstrumentSchema {
        id: "RSD",
        description: "Raindrop size distribution disdrometer",
        header_fields: header(&[
            "Mete_data_code",
            "Manufacturer_model",
            "Software_version",
            "RSD_sens_HGT",
            "Data_level",
            "Timezone",
            "Time_resolution",
            "Numb_part_diam_clas",
            "Numb_part_velo_clas",
            "Part_diam_clas",
            "Part_velo_clas",
        ]),
        boundaries: boundaries(15),
        obs_fields: vec![
            DATETIME,
            ObsField::scalar("Syno_4678_1MIN", "1-minute SYNOP 4678 weather code", "-", Code),
            ObsField::scalar("Syno_4678_5MIN", "5-minute SYNOP 4678 weather code", "-", Code),
            ObsField::scalar("Prec_inte", "Precipitation intensity", "mm/h", Float),
            ObsField::scalar("Prec_cumu", "Cumulative precipitation", "mm", Float),
            ObsField::scalar("Rada_refl", "Radar reflectivity", "dBZ", Float),
            ObsField::scalar("MOR_VIS", "Meteorological optical range", "m", Float),
            ObsField::scalar("Numb_part", "Number of detected particles", "-", Integer),
            ObsField::array(
                "Prec_spec",
                "Precipitation spectrum",
                "-",
                Integer,
                FieldShape::Matrix(22, 20),
                &["Dime_numb_part_diam_clas", "Dime_numb_part_velo_clas"],
            ),
            qc("Q_data", "Quality control code"),
        ],
        primary_timestamp: "Datetime",
        layout: RowLayout::Columnar,
        grouping: BlockGrouping::Matrix,
        naming: naming("SURF", "RSD", "THIE", "LX", true),
        overrides: vec![],
    }
}

const HGT_58: &[&str] = &["Dime_HGT_58"];

fn mrd() -> InstrumentSchema {
    let profile = |code, long_name, unit| {
        ObsField::array(code, long_name, unit, Float, FieldShape::Vector(58), HGT_58)
    };
    let optional_time = |code, long_name| ObsField::scalar(code, long_name, TIME_UNIT, OptionalTimestamp);
    InstrumentSchema {
        id: "MRD",
        description: "Microwave radiometer, level 2 profiles",
        header_fields: header(&[
            "Mete_data_code",
            "Manufacturer_model",
            "Software_version",
            "MRD_sens_HGT",
            "Data_level",
            "Timezone",
            "HGT",
        ]),
        boundaries: boundaries(15),
        obs_fields: vec![
            ObsField::scalar("Datetime_301", "Datetime of ambient observation", TIME_UNIT, Timestamp),
            optional_time("Datetime_31", "Datetime of brightness temperature"),
            optional_time("Datetime_201", "Datetime of integrated products"),
            optional_time("GPS_DT", "GPS datetime"),
            ObsField::scalar("Temp_ambi", "Ambient temperature", "K", Float),
            ObsField::scalar("RH_ambi", "Ambient relative humidity", "%", Float),
            ObsField::scalar("Pres_ambi", "Ambient pressure", "hPa", Float),
            ObsField::scalar("Tir", "Infrared temperature", "K", Float),
            ObsField::scalar("Rain", "Rain flag", "-", Integer),
            optional_time("Datetime_401", "Datetime of temperature profile"),
            profile("Temp_prof", "Temperature profile", "K"),
            optional_time("Datetime_402", "Datetime of water vapour density profile"),
            profile("VAP_prof", "Water vapour density profile", "g/m3"),
            optional_time("Datetime_403", "Datetime of liquid water content profile"),
            profile("LWC_prof", "Liquid water content profile", "g/m3"),
            optional_time("Datetime_404", "Datetime of relative humidity profile"),
            profile("RH_prof", "Relative humidity profile", "%"),
            qc("Q_Temp_ambi", "Quality control code of ambient temperature"),
            qc("Q_RH_ambi", "Quality control code of ambient relative humidity"),
            qc("Q_Pres_ambi", "Quality control code of ambient pressure"),
        ],
        primary_timestamp: "Datetime_301",
        layout: RowLayout::Columnar,
        grouping: BlockGrouping::MultiAxis,
        naming: naming("UPAR", "MRD", "RAD", "L2", true),
        overrides: vec![],
    }
}

fn fsd() -> InstrumentSchema {
    InstrumentSchema {
        id: "FSD",
        description: "Fog droplet spectrometer",
        header_fields: header(&[
            "Mete_data_code",
            "Manufacturer_model",
            "Software_version",
            "FSD_sens_HGT",
            "Data_level",
            "Timezone",
            "Time_resolution",
            "Sample_area",
            "Channel_count",
            "Size_each_bin",
        ]),
        boundaries: boundaries(15),
        obs_fields: vec![
            DATETIME,
            ObsField::array(
                "Numb_part_chan",
                "Particles number per channel",
                "-",
                Float,
                FieldShape::Vector(20),
                &["Dime_numb_part_ch"],
            )
            .scattered("Numb_part_ch"),
            ObsField::scalar("Numb_conc", "Number concentration", "1/cm3", Float),
            ObsField::scalar("Volu_conc", "Volume concentration", "um3/cm3", Float),
            ObsField::scalar("LWC", "Liquid water content", "g/m3", Float),
            ObsField::scalar("MVD", "Median volume diameter", "um", Float),
            qc("Q_data", "Quality control code"),
        ],
        primary_timestamp: "Datetime",
        layout: RowLayout::Columnar,
        grouping: BlockGrouping::FixedVector,
        naming: naming("SURF", "FSD", "DMT", "LX", true),
        overrides: vec![],
    }
}

const TEMP_SERIES: &[SeriesColumn] = &[
    SeriesColumn {
        code: "Temp",
        source: "TEM",
        long_name: "Temperature",
        unit: "degC",
        kind: Float,
    },
    SeriesColumn {
        code: "Q_Temp",
        source: "Q_TEM",
        long_name: "Quality control code of temperature",
        unit: "-",
        kind: Integer,
    },
];

const PREC_SERIES: &[SeriesColumn] = &[
    SeriesColumn {
        code: "Prec",
        source: "PRE",
        long_name: "Precipitation",
        unit: "mm",
        kind: Float,
    },
    SeriesColumn {
        code: "Q_Prec",
        source: "Q_PRE",
        long_name: "Quality control code of precipitation",
        unit: "-",
        kind: Integer,
    },
];

const OCLOCK_SERIES: &[SeriesColumn] = &[
    SeriesColumn {
        code: "Temp_MAX",
        source: "TEM_Max",
        long_name: "Temperature maximum",
        unit: "degC",
        kind: Float,
    },
    SeriesColumn {
        code: "Prec_cumu",
        source: "PRE_Cum",
        long_name: "Cumulative precipitation",
        unit: "mm",
        kind: Float,
    },
    SeriesColumn {
        code: "Q_Temp_MAX",
        source: "Q_TEM_Max",
        long_name: "Quality control code of temperature maximum",
        unit: "-",
        kind: Integer,
    },
    SeriesColumn {
        code: "Q_Prec_cumu",
        source: "Q_PRE_Cum",
        long_name: "Quality control code of cumulative precipitation",
        unit: "-",
        kind: Integer,
    },
];

fn pre() -> InstrumentSchema {
    InstrumentSchema {
        id: "PRE",
        description: "Rain gauge with temperature logger",
        header_fields: header(&[
            "Mete_data_code",
            "Manufacturer_model",
            "Software_version",
            "Prec_sens_HGT",
            "Data_level",
            "Timezone",
            "Time_resolution",
        ]),
        boundaries: boundaries(15),
        obs_fields: vec![
            DATETIME,
            ObsField::scalar("TEM", "Temperature", "degC", Float),
            qc("Q_TEM", "Quality control code of temperature"),
            ObsField::scalar("PRE", "Precipitation", "mm", Float),
            qc("Q_PRE", "Quality control code of precipitation"),
            ObsField::scalar("TEM_Max", "Temperature maximum", "degC", Float),
            qc("Q_TEM_Max", "Quality control code of temperature maximum"),
            ObsField::scalar("PRE_Cum", "Cumulative precipitation", "mm", Float),
            qc("Q_PRE_Cum", "Quality control code of cumulative precipitation"),
        ],
        primary_timestamp: "Datetime",
        layout: RowLayout::SubSeries,
        grouping: BlockGrouping::SubSeries(vec![
            SubSeries {
                dimension: "Datetime_Temp",
                long_name: "Datetime of temperature",
                filter: &["TEM"],
                columns: TEMP_SERIES,
            },
            SubSeries {
                dimension: "Datetime_Prec",
                long_name: "Datetime of precipitation",
                filter: &["PRE"],
                columns: PREC_SERIES,
            },
            SubSeries {
                dimension: "Datetime_oclock",
                long_name: "Date and o'clock of temperature maximum and cumulative precipitation",
                filter: &["TEM_Max", "PRE_Cum"],
                columns: OCLOCK_SERIES,
            },
        ]),
        naming: naming("SURF", "PRE", "HOBO", "LX", true),
        overrides: vec![],
    }
}

fn rrd_header_raw() -> Vec<HeaderField> {
    header(&[
        "Mete_data_code",
        "Manufacturer_model",
        "RRD_sens_HGT",
        "Service_version",
        "Device_version",
        "Devi_seri_numb",
        "Bandwidth",
        "Calibration_constant",
        "MMR_data_qual",
        "Data_level",
        "Timezone",
        "Time_resolution",
    ])
}

fn rrd_lraw() -> InstrumentSchema {
    const HGT_32: &[&str] = &["Dime_HGT_32"];
    InstrumentSchema {
        id: "RRD_Lraw",
        description: "Micro rain radar, raw spectra",
        header_fields: rrd_header_raw(),
        boundaries: boundaries(19),
        obs_fields: vec![
            DATETIME,
            ObsField::array("HGT", "Height", "m", Integer, FieldShape::Vector(32), HGT_32),
            ObsField::array(
                "Transfer_function",
                "Transfer function",
                "-",
                Float,
                FieldShape::Vector(32),
                HGT_32,
            ),
            ObsField::array(
                "Spectral_reflectivities",
                "Spectral reflectivities",
                "dB",
                Float,
                FieldShape::Matrix(64, 32),
                &["Dime_HGT_32", "Dime_part_diam_clas"],
            )
            .transposed(),
            qc("Q_data", "Quality control code"),
        ],
        primary_timestamp: "Datetime",
        layout: RowLayout::Tagged,
        grouping: BlockGrouping::Matrix,
        naming: naming("RADA", "RRD", "METE", "Lraw", true),
        overrides: vec![],
    }
}

fn rrd_processed(
    id: &'static str,
    level: &'static str,
    description: &'static str,
) -> InstrumentSchema {
    const HGT_31: &[&str] = &["Dime_HGT_31"];
    const MATRIX_AXES: &[&str] = &["Dime_HGT_31", "Dime_part_diam_clas"];
    let matrix = |code, long_name, unit| {
        ObsField::array(code, long_name, unit, Float, FieldShape::Matrix(64, 31), MATRIX_AXES)
            .transposed()
    };
    let profile =
        |code, long_name, unit| ObsField::array(code, long_name, unit, Float, FieldShape::Vector(31), HGT_31);
    InstrumentSchema {
        id,
        description,
        header_fields: header(&[
            "Mete_data_code",
            "Manufacturer_model",
            "RRD_sens_HGT",
            "Service_version",
            "Device_version",
            "Devi_seri_numb",
            "Calibration_constant",
            "MMR_data_qual",
            "Time_AVG",
            "Sampling_rate",
            "Data_level",
            "Timezone",
            "Time_resolution",
        ]),
        boundaries: boundaries(18),
        obs_fields: vec![
            DATETIME,
            ObsField::array("HGT", "Height", "m", Integer, FieldShape::Vector(31), HGT_31),
            profile("Transfer_function", "Transfer function", "-"),
            matrix("Spectral_reflectivities", "Spectral reflectivities", "dB"),
            matrix("Drop_size", "Drop size", "mm"),
            matrix("Spec_drop_dens", "Spectral drop densities", "1/(m3*mm)"),
            profile("Path_Inte_Atte", "Path integrated attenuation", "dB"),
            profile("Z_Atte", "Attenuated radar reflectivity", "dBZ"),
            profile("Z_Atte_corr", "Attenuation corrected radar reflectivity", "dBZ"),
            profile("Rain_rate", "Rain rate", "mm/h"),
            profile("LWC", "Liquid water content", "g/m3"),
            profile("W", "Fall velocity", "m/s"),
            qc("Q_data", "Quality control code"),
        ],
        primary_timestamp: "Datetime",
        layout: RowLayout::Tagged,
        grouping: BlockGrouping::MultiAxis,
        naming: naming("RADA", "RRD", "METE", level, true),
        overrides: vec![HeaderOverride::Fixed {
            code: "Data_level",
            value: level,
        }],
    }
}
