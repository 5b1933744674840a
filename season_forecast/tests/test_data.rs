use chrono::NaiveDate;
use season_forecast::data::{Column, DataLoader};
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn test_data_loader_from_csv() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        "Tema,Cantidad Pedida,Precio Coste,P.V.P.,Artículo,Talla,Fecha Presupuesto,Extra"
    )
    .unwrap();
    writeln!(file, "T_PV24 01, 12 ,10.5,25,A1,M,15/03/2024,x").unwrap();
    writeln!(file, "SIN DEFINIR,abc,,30,,38,2024-06-01,y").unwrap();
    writeln!(file, "T_OI24 02,4,8,20,A2,L,not a date,z").unwrap();

    let table = DataLoader::from_csv(file.path(), b',').unwrap();

    assert_eq!(table.len(), 3);
    assert!(table.has_column(Column::Article));
    assert!(table.has_month());
    assert!(!table.has_column(Column::Brand));

    let first = &table.records()[0];
    assert_eq!(first.ordered_quantity, Some(12.0));
    assert_eq!(first.cost_price, Some(10.5));
    assert_eq!(first.article.as_deref(), Some("A1"));
    assert_eq!(first.budget_date, NaiveDate::from_ymd_opt(2024, 3, 15));
    assert_eq!(first.month(), Some(3));
    // Seasons are attached by a separate stage
    assert_eq!(first.season, None);

    let second = &table.records()[1];
    assert_eq!(second.ordered_quantity, None);
    assert_eq!(second.cost_price, None);
    assert_eq!(second.article, None);
    assert_eq!(second.size.as_deref(), Some("38"));
    assert_eq!(second.month(), Some(6));

    assert_eq!(table.records()[2].budget_date, None);
}

#[test]
fn test_data_loader_custom_delimiter() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "Tema;Cantidad Pedida;Precio Coste;P.V.P.").unwrap();
    writeln!(file, "T_OI25 07;3;5;9.95").unwrap();

    let table = DataLoader::from_csv(file.path(), b';').unwrap();
    assert_eq!(table.len(), 1);
    assert_eq!(table.records()[0].list_price, Some(9.95));
    assert_eq!(table.records()[0].theme.as_deref(), Some("T_OI25 07"));
}

#[test]
fn test_data_loader_missing_file() {
    assert!(DataLoader::from_csv("/non/existent/history.csv", b',').is_err());
}
