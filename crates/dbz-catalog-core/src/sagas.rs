//! In-memory saga catalog (Dragon Ball, Z, GT, Super), kept in chronological order.

use crate::pipeline::{compare_names, Listable};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Series {
    #[serde(rename = "Dragon Ball")]
    DragonBall,
    #[serde(rename = "Dragon Ball Z")]
    DragonBallZ,
    #[serde(rename = "Dragon Ball GT")]
    DragonBallGt,
    #[serde(rename = "Dragon Ball Super")]
    DragonBallSuper,
}

impl Series {
    pub fn label(&self) -> &'static str {
        match self {
            Series::DragonBall => "Dragon Ball",
            Series::DragonBallZ => "Dragon Ball Z",
            Series::DragonBallGt => "Dragon Ball GT",
            Series::DragonBallSuper => "Dragon Ball Super",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SagaArc {
    pub name: String,
    pub episode_start: Option<u32>,
    pub episode_end: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Saga {
    pub id: u32,
    pub series: Option<Series>,
    pub name: String,
    /// Episode numbering restarts with each series.
    pub episode_start: u32,
    pub episode_end: u32,
    pub summary: Option<String>,
    pub season: Option<u32>,
    pub year: Option<u16>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub arcs: Vec<SagaArc>,
}

impl Saga {
    pub fn episode_count(&self) -> u32 {
        self.episode_end.saturating_sub(self.episode_start) + 1
    }
}

impl Listable for Saga {
    fn display_name(&self) -> &str {
        &self.name
    }

    fn group_label(&self) -> Option<&str> {
        self.series.as_ref().map(Series::label)
    }
}

#[allow(clippy::too_many_arguments)]
fn saga(
    id: u32,
    series: Series,
    name: &str,
    episodes: (u32, u32),
    summary: &str,
    season: u32,
    year: u16,
    arcs: &[(&str, u32, u32)],
) -> Saga {
    Saga {
        id,
        series: Some(series),
        name: name.to_string(),
        episode_start: episodes.0,
        episode_end: episodes.1,
        summary: Some(summary.to_string()),
        season: Some(season),
        year: Some(year),
        arcs: arcs
            .iter()
            .map(|(n, s, e)| SagaArc {
                name: n.to_string(),
                episode_start: Some(*s),
                episode_end: Some(*e),
            })
            .collect(),
    }
}

static SAGAS: Lazy<Vec<Saga>> = Lazy::new(|| {
    use Series::*;
    vec![
        // Dragon Ball: 153 episodes
        saga(101, DragonBall, "Emperador Pilaf", (1, 13),
            "Inicio del viaje de Gokū y Bulma para reunir las esferas del dragón; primer antagonista: Pilaf.", 1, 1986,
            &[("Encuentro con Bulma", 1, 2), ("Oolong y el Monte Fry-pan", 3, 8), ("Pilaf y la primera invocación", 9, 13)]),
        saga(102, DragonBall, "21.º Tenkaichi Budōkai", (14, 28),
            "Gokū y Krilin entrenan con el Maestro Roshi y participan en su primer torneo mundial.", 1, 1986, &[]),
        saga(103, DragonBall, "Ejército Red Ribbon", (29, 68),
            "Gokū enfrenta a la Red Ribbon en la búsqueda de las esferas; introduce a personajes como el General Blue.", 2, 1986,
            &[("General Silver", 29, 33), ("General White (Muscle Tower)", 34, 45), ("General Blue", 46, 57), ("General Red", 58, 68)]),
        saga(104, DragonBall, "22.º Tenkaichi Budōkai", (69, 83),
            "Segundo torneo mundial, destacando la rivalidad con el dojo de Tsuru (Ten Shin Han y Chaoz).", 2, 1987, &[]),
        saga(105, DragonBall, "Piccolo Daimaō", (84, 122),
            "Resurrección de Piccolo Daimaō y batalla por salvar el mundo.", 3, 1988, &[]),
        saga(106, DragonBall, "23.º Tenkaichi Budōkai", (123, 153),
            "Tercer torneo: Gokū vs. Piccolo Jr.; cierre de la etapa infantil y puente hacia DBZ.", 3, 1989, &[]),
        // Dragon Ball Z: 1–291
        saga(1, DragonBallZ, "Saga Saiyan", (1, 35),
            "Llegada de Raditz, Nappa y Vegeta; formación de los Guerreros Z.", 1, 1989,
            &[("Raditz", 1, 6), ("Entrenamiento y Kaio", 7, 17), ("Nappa y Vegeta", 18, 35)]),
        saga(2, DragonBallZ, "Saga Namek/Freezer", (36, 107),
            "Viaje a Namek; combate contra las Fuerzas Ginyū y Freezer.", 2, 1990,
            &[("Llegada a Namek", 36, 60), ("Fuerzas Ginyū", 61, 74), ("Freezer", 75, 107)]),
        saga(3, DragonBallZ, "Garlic Jr. (relleno)", (108, 117),
            "Retorno de Garlic Jr. y la Niebla del Agua Negra.", 3, 1991, &[]),
        saga(4, DragonBallZ, "Saga de los Androides", (118, 139),
            "Aparición de Trunks del futuro y androides 19/20/17/18.", 3, 1991, &[]),
        saga(5, DragonBallZ, "Saga de Cell", (140, 165),
            "Evolución de Cell hasta su forma perfecta y Juegos de Cell.", 4, 1992, &[]),
        saga(6, DragonBallZ, "Gran Saiyaman y Torneo Mundial", (166, 194),
            "Vida escolar de Gohan y nuevo torneo de artes marciales.", 5, 1993, &[]),
        saga(7, DragonBallZ, "Saga de Babidi", (195, 219),
            "Babidi busca revivir a Majin Buu recolectando energía.", 6, 1994, &[]),
        saga(8, DragonBallZ, "Saga de Majin Buu", (220, 253),
            "Aparición y evolución de Majin Buu; múltiples batallas.", 6, 1994, &[]),
        saga(9, DragonBallZ, "Saga de la Fusión", (254, 275),
            "Gotenks y Vegetto entran en acción para enfrentar a Buu.", 7, 1995, &[]),
        saga(10, DragonBallZ, "Saga de Kid Buu", (276, 291),
            "Batalla final contra Kid Buu y cierre de DBZ.", 7, 1996, &[]),
        // Dragon Ball GT: 1–64
        saga(201, DragonBallGt, "Esferas del Dragón de Estrellas Negras", (1, 16),
            "Gokū niño viaja por el espacio para recuperar las esferas antes de que la Tierra explote.", 1, 1996, &[]),
        saga(202, DragonBallGt, "Saga de Baby", (17, 40),
            "El parásito Tuffle, Baby, busca venganza y domina cuerpos para conquistar la Tierra.", 1, 1996,
            &[("Infiltración de Baby", 17, 29), ("Baby Vegeta", 30, 40)]),
        saga(203, DragonBallGt, "Super N°17", (41, 47),
            "Fusión de N°17 y Hell Fighter N°17 que crea a Super 17.", 2, 1997, &[]),
        saga(204, DragonBallGt, "Dragones Oscuros", (48, 64),
            "Nacen los Siete Dragones Oscuros por el abuso de las esferas; combate final de GT.", 2, 1997, &[]),
        // Dragon Ball Super: 1–131
        saga(301, DragonBallSuper, "Batalla de los Dioses", (1, 14),
            "Aparición de Bills, el Dios de la Destrucción; Gokū alcanza el SSJ Dios.", 1, 2015, &[]),
        saga(302, DragonBallSuper, "La Resurrección de Freezer", (15, 27),
            "Freezer es resucitado; Gokū y Vegeta entrenan con Whis.", 1, 2015, &[]),
        saga(303, DragonBallSuper, "Torneo del Universo 6", (28, 46),
            "Torneo amistoso entre los Universos 6 y 7 organizado por Champa.", 1, 2016, &[]),
        saga(304, DragonBallSuper, "Trunks del Futuro / Goku Black", (47, 76),
            "Amenaza de Goku Black y Zamasu; viajes temporales y fusión.", 2, 2016, &[]),
        saga(305, DragonBallSuper, "Supervivencia Universal (Torneo del Poder)", (77, 131),
            "Torneo entre múltiples universos con existencia en juego; Gokū alcanza el Ultra Instinto.", 3, 2017, &[]),
    ]
});

/// Order accepted by [`SagaCatalog::paged`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SagaOrder {
    #[default]
    Chrono,
    Az,
    Za,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedSagas {
    pub items: Vec<Saga>,
    pub total_items: usize,
}

/// Read-only view over the hard-coded catalog.
#[derive(Debug, Clone, Copy, Default)]
pub struct SagaCatalog;

impl SagaCatalog {
    /// Whole catalog in chronological order (DB → DBZ → GT → Super).
    pub fn all(&self) -> &'static [Saga] {
        SAGAS.as_slice()
    }

    pub fn get(&self, id: u32) -> Option<&'static Saga> {
        SAGAS.iter().find(|s| s.id == id)
    }

    /// Search/order/paginate with a 1-based page. Alphabetical orders group by series
    /// first; `Chrono` keeps catalog order.
    pub fn paged(&self, page: usize, page_size: usize, search: Option<&str>, order: SagaOrder) -> PagedSagas {
        let page = page.max(1);
        let size = page_size.max(1);

        let needle = search.map(|s| s.trim().to_lowercase()).filter(|s| !s.is_empty());
        let mut rows: Vec<&Saga> = SAGAS
            .iter()
            .filter(|s| match &needle {
                Some(q) => {
                    s.name.to_lowercase().contains(q.as_str())
                        || s.series.map(|x| x.label().to_lowercase().contains(q.as_str())).unwrap_or(false)
                }
                None => true,
            })
            .collect();

        if order != SagaOrder::Chrono {
            rows.sort_by(|a, b| {
                let series = |s: &Saga| s.series.map(|x| x.label()).unwrap_or("");
                compare_names(series(*a), series(*b)).then_with(|| match order {
                    SagaOrder::Za => compare_names(&b.name, &a.name),
                    _ => compare_names(&a.name, &b.name),
                })
            });
        }

        let total_items = rows.len();
        let items = rows
            .into_iter()
            .skip((page - 1) * size)
            .take(size)
            .cloned()
            .collect();
        PagedSagas { items, total_items }
    }
}
