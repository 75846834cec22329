//! Shapes, bounds and grid cells behind a place's spatial footprint.

use std::collections::BTreeMap;
use std::fmt::Write;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use graph::Iri;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::content::{Location, Precision};
use crate::uri::build_uri;

pub(crate) type Coord = (f64, f64);

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Bounds {
    pub(crate) min_x: f64,
    pub(crate) min_y: f64,
    pub(crate) max_x: f64,
    pub(crate) max_y: f64,
}

impl Bounds {
    pub(crate) fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Bounds {
        Bounds {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    fn of(coord: Coord) -> Bounds {
        Bounds::new(coord.0, coord.1, coord.0, coord.1)
    }

    pub(crate) fn union(self, other: Bounds) -> Bounds {
        Bounds::new(
            self.min_x.min(other.min_x),
            self.min_y.min(other.min_y),
            self.max_x.max(other.max_x),
            self.max_y.max(other.max_y),
        )
    }

    pub(crate) fn center(&self) -> Coord {
        (
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    /// Closed ring starting at the south-east corner.
    pub(crate) fn ring(&self) -> [Coord; 5] {
        [
            (self.max_x, self.min_y),
            (self.max_x, self.max_y),
            (self.min_x, self.max_y),
            (self.min_x, self.min_y),
            (self.max_x, self.min_y),
        ]
    }

    pub(crate) fn to_geojson(&self) -> String {
        let ring: Vec<[f64; 2]> = self.ring().iter().map(|&(x, y)| [x, y]).collect();
        json!({"type": "Polygon", "coordinates": [ring]}).to_string()
    }

    pub(crate) fn to_wkt(&self) -> String {
        format!("POLYGON (({}))", wkt_positions(&self.ring()))
    }

    fn from_bbox(value: &Value) -> Result<Bounds> {
        let numbers = value
            .as_array()
            .context("bbox should be an array")?
            .iter()
            .map(number)
            .collect::<Result<Vec<_>>>()?;
        match numbers.as_slice() {
            [min_x, min_y, max_x, max_y] => Ok(Bounds::new(*min_x, *min_y, *max_x, *max_y)),
            _ => bail!("bbox should hold four numbers"),
        }
    }
}

/// An exact GeoJSON geometry.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Shape {
    Point(Coord),
    MultiPoint(Vec<Coord>),
    LineString(Vec<Coord>),
    MultiLineString(Vec<Vec<Coord>>),
    Polygon(Vec<Vec<Coord>>),
    MultiPolygon(Vec<Vec<Vec<Coord>>>),
    GeometryCollection(Vec<Shape>),
}

impl Shape {
    pub(crate) fn from_geojson(value: &Value) -> Result<Shape> {
        let kind = value
            .get("type")
            .and_then(Value::as_str)
            .context("geometry has no type")?;
        if kind == "GeometryCollection" {
            let members = value
                .get("geometries")
                .and_then(Value::as_array)
                .context("collection has no geometries")?;
            let members = members
                .iter()
                .map(Shape::from_geojson)
                .collect::<Result<_>>()?;
            return Ok(Shape::GeometryCollection(members));
        }
        let c = value
            .get("coordinates")
            .with_context(|| format!("{kind} has no coordinates"))?;
        Ok(match kind {
            "Point" => Shape::Point(position(c)?),
            "MultiPoint" => Shape::MultiPoint(positions(c)?),
            "LineString" => Shape::LineString(positions(c)?),
            "MultiLineString" => Shape::MultiLineString(nested(c, positions)?),
            "Polygon" => Shape::Polygon(nested(c, positions)?),
            "MultiPolygon" => Shape::MultiPolygon(nested(c, |p| nested(p, positions))?),
            other => bail!("unsupported geometry type {other}"),
        })
    }

    fn visit<F: FnMut(Coord)>(&self, f: &mut F) {
        match self {
            Shape::Point(c) => f(*c),
            Shape::MultiPoint(cs) | Shape::LineString(cs) => cs.iter().for_each(|c| f(*c)),
            Shape::MultiLineString(ls) | Shape::Polygon(ls) => {
                ls.iter().flatten().for_each(|c| f(*c))
            }
            Shape::MultiPolygon(ps) => ps.iter().flatten().flatten().for_each(|c| f(*c)),
            Shape::GeometryCollection(members) => {
                for member in members {
                    member.visit(f);
                }
            }
        }
    }

    /// None for a shape without positions.
    pub(crate) fn bounds(&self) -> Option<Bounds> {
        let mut bounds: Option<Bounds> = None;
        self.visit(&mut |c| {
            bounds = Some(bounds.map_or(Bounds::of(c), |b| b.union(Bounds::of(c))));
        });
        bounds
    }

    /// Centroid of the highest dimension with a non-zero measure.
    pub(crate) fn centroid(&self) -> Option<Coord> {
        let mut acc = CentroidSum::default();
        acc.add(self);
        acc.result()
    }

    pub(crate) fn to_geojson(&self) -> Value {
        fn arr(cs: &[Coord]) -> Vec<[f64; 2]> {
            cs.iter().map(|&(x, y)| [x, y]).collect()
        }
        match self {
            Shape::Point((x, y)) => json!({"type": "Point", "coordinates": [x, y]}),
            Shape::MultiPoint(cs) => json!({"type": "MultiPoint", "coordinates": arr(cs)}),
            Shape::LineString(cs) => json!({"type": "LineString", "coordinates": arr(cs)}),
            Shape::MultiLineString(ls) => json!({
                "type": "MultiLineString",
                "coordinates": ls.iter().map(|l| arr(l)).collect::<Vec<_>>(),
            }),
            Shape::Polygon(rings) => json!({
                "type": "Polygon",
                "coordinates": rings.iter().map(|r| arr(r)).collect::<Vec<_>>(),
            }),
            Shape::MultiPolygon(ps) => json!({
                "type": "MultiPolygon",
                "coordinates": ps
                    .iter()
                    .map(|p| p.iter().map(|r| arr(r)).collect::<Vec<_>>())
                    .collect::<Vec<_>>(),
            }),
            Shape::GeometryCollection(members) => json!({
                "type": "GeometryCollection",
                "geometries": members.iter().map(Shape::to_geojson).collect::<Vec<_>>(),
            }),
        }
    }

    pub(crate) fn to_wkt(&self) -> String {
        fn group(items: impl Iterator<Item = String>) -> String {
            format!("({})", items.collect::<Vec<_>>().join(", "))
        }
        fn rings(rs: &[Vec<Coord>]) -> String {
            group(rs.iter().map(|r| format!("({})", wkt_positions(r))))
        }
        let (tag, body) = match self {
            Shape::Point(c) => ("POINT", format!("({})", wkt_positions(std::slice::from_ref(c)))),
            Shape::MultiPoint(cs) => (
                "MULTIPOINT",
                group(cs.iter().map(|c| format!("({})", wkt_positions(std::slice::from_ref(c))))),
            ),
            Shape::LineString(cs) => ("LINESTRING", format!("({})", wkt_positions(cs))),
            Shape::MultiLineString(ls) => ("MULTILINESTRING", rings(ls)),
            Shape::Polygon(rs) => ("POLYGON", rings(rs)),
            Shape::MultiPolygon(ps) => ("MULTIPOLYGON", group(ps.iter().map(|p| rings(p)))),
            Shape::GeometryCollection(members) => (
                "GEOMETRYCOLLECTION",
                group(members.iter().map(Shape::to_wkt)),
            ),
        };
        if body == "()" {
            format!("{tag} EMPTY")
        } else {
            format!("{tag} {body}")
        }
    }
}

#[derive(Default)]
struct CentroidSum {
    area: f64,
    area_x: f64,
    area_y: f64,
    length: f64,
    length_x: f64,
    length_y: f64,
    points: usize,
    point_x: f64,
    point_y: f64,
}

impl CentroidSum {
    fn add(&mut self, shape: &Shape) {
        match shape {
            Shape::Point(c) => self.add_point(*c),
            Shape::MultiPoint(cs) => cs.iter().for_each(|c| self.add_point(*c)),
            Shape::LineString(cs) => self.add_line(cs),
            Shape::MultiLineString(ls) => ls.iter().for_each(|l| self.add_line(l)),
            Shape::Polygon(rings) => self.add_polygon(rings),
            Shape::MultiPolygon(ps) => ps.iter().for_each(|p| self.add_polygon(p)),
            Shape::GeometryCollection(members) => members.iter().for_each(|m| self.add(m)),
        }
    }

    fn add_point(&mut self, (x, y): Coord) {
        self.points += 1;
        self.point_x += x;
        self.point_y += y;
    }

    fn add_line(&mut self, line: &[Coord]) {
        for pair in line.windows(2) {
            let ((x0, y0), (x1, y1)) = (pair[0], pair[1]);
            let len = (x1 - x0).hypot(y1 - y0);
            self.length += len;
            self.length_x += len * (x0 + x1) / 2.0;
            self.length_y += len * (y0 + y1) / 2.0;
        }
    }

    fn add_polygon(&mut self, rings: &[Vec<Coord>]) {
        for (i, ring) in rings.iter().enumerate() {
            // holes subtract from the exterior
            let sign = if i == 0 { 1.0 } else { -1.0 };
            if let Some((area, (cx, cy))) = ring_centroid(ring) {
                self.area += sign * area;
                self.area_x += sign * area * cx;
                self.area_y += sign * area * cy;
            }
            self.add_line(ring);
        }
    }

    fn result(&self) -> Option<Coord> {
        if self.area > f64::EPSILON {
            Some((self.area_x / self.area, self.area_y / self.area))
        } else if self.length > 0.0 {
            Some((self.length_x / self.length, self.length_y / self.length))
        } else if self.points > 0 {
            let n = self.points as f64;
            Some((self.point_x / n, self.point_y / n))
        } else {
            None
        }
    }
}

/// Unsigned area and centroid of a ring, by the shoelace formula.
fn ring_centroid(ring: &[Coord]) -> Option<(f64, Coord)> {
    let (mut twice_area, mut cx, mut cy) = (0.0, 0.0, 0.0);
    for pair in ring.windows(2) {
        let ((x0, y0), (x1, y1)) = (pair[0], pair[1]);
        let cross = x0 * y1 - x1 * y0;
        twice_area += cross;
        cx += (x0 + x1) * cross;
        cy += (y0 + y1) * cross;
    }
    if twice_area == 0.0 {
        return None;
    }
    let area = twice_area / 2.0;
    Some((area.abs(), (cx / (6.0 * area), cy / (6.0 * area))))
}

fn number(value: &Value) -> Result<f64> {
    value.as_f64().context("coordinate should be a number")
}

fn position(value: &Value) -> Result<Coord> {
    let items = value.as_array().context("position should be an array")?;
    match items.as_slice() {
        [x, y, ..] => Ok((number(x)?, number(y)?)),
        _ => bail!("position needs at least two numbers"),
    }
}

fn positions(value: &Value) -> Result<Vec<Coord>> {
    nested(value, position)
}

fn nested<T>(value: &Value, item: impl Fn(&Value) -> Result<T>) -> Result<Vec<T>> {
    value
        .as_array()
        .context("coordinates should be an array")?
        .iter()
        .map(item)
        .collect()
}

fn wkt_positions(coords: &[Coord]) -> String {
    let mut out = String::new();
    for (i, (x, y)) in coords.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        let _ = write!(out, "{x} {y}");
    }
    out
}

/// What a location geometry tells about extent: an exact shape, or only a
/// bounding box.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Footprint {
    pub(crate) shape: Option<Shape>,
    pub(crate) bounds: Bounds,
}

impl Footprint {
    pub(crate) fn from_geojson(value: &Value) -> Result<Footprint> {
        let shape = match value.get("type") {
            Some(_) => Some(Shape::from_geojson(value)?),
            None => None,
        };
        let bounds = match (shape.as_ref().and_then(Shape::bounds), value.get("bbox")) {
            (Some(bounds), _) => bounds,
            (None, Some(bbox)) => Bounds::from_bbox(bbox)?,
            (None, None) => bail!("geometry has no extent"),
        };
        Ok(Footprint { shape, bounds })
    }

    pub(crate) fn centroid(&self) -> Option<Coord> {
        self.shape.as_ref().and_then(Shape::centroid)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Point {
    pub(crate) lat: f64,
    pub(crate) long: f64,
}

impl From<Coord> for Point {
    fn from((x, y): Coord) -> Point {
        Point { lat: y, long: x }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum GridScope {
    /// At most a sheet and one `+` separated list of cells.
    Place,
    /// Every segment after the sheet is one cell.
    Location,
}

/// A parsed grid identifier: `<base><sheet>[/<cell>[+<cell>...]]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct GridRef {
    pub(crate) sheet: String,
    /// `None` addresses the whole sheet.
    pub(crate) cells: Vec<Option<String>>,
}

impl GridRef {
    /// `Ok(None)` when `reference` is not under `grid_base` at all.
    pub(crate) fn parse(grid_base: &str, reference: &str, scope: GridScope) -> Result<Option<GridRef>> {
        let Some(rest) = reference.trim().strip_prefix(grid_base) else {
            return Ok(None);
        };
        let segments: Vec<&str> = rest.trim_matches('/').split('/').collect();
        let sheet = segments[0];
        if sheet.is_empty() {
            bail!("grid reference {reference} has no map sheet");
        }
        let cells: Vec<&str> = match (segments.len(), scope) {
            (1, _) => {
                return Ok(Some(GridRef {
                    sheet: sheet.to_owned(),
                    cells: vec![None],
                }));
            }
            (2, _) => segments[1].split('+').collect(),
            (_, GridScope::Location) => segments[1..].to_vec(),
            (n, GridScope::Place) => bail!("grid reference {reference} has {n} path segments"),
        };
        if cells.iter().any(|c| c.trim().is_empty()) {
            bail!("grid reference {reference} has an empty cell");
        }
        Ok(Some(GridRef {
            sheet: sheet.to_owned(),
            cells: cells
                .into_iter()
                .map(|c| Some(c.trim().to_uppercase()))
                .collect(),
        }))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct GridCell {
    pub(crate) uri: Iri,
    pub(crate) extent: Iri,
    pub(crate) bounds: Bounds,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct MapSheet {
    pub(crate) id: String,
    /// `[minx, miny, maxx, maxy]`
    pub(crate) bounds: [f64; 4],
    /// Column letters from west to east.
    pub(crate) columns: String,
    /// Rows are numbered from 1 at the north edge.
    pub(crate) rows: u32,
}

impl MapSheet {
    fn cell_bounds(&self, cell: &str) -> Result<Bounds> {
        let [min_x, min_y, max_x, max_y] = self.bounds;
        let split = cell
            .find(|c: char| c.is_ascii_digit())
            .with_context(|| format!("cell {cell} has no row"))?;
        let (column, row) = cell.split_at(split);
        let mut letters = column.chars();
        let (Some(letter), None) = (letters.next(), letters.next()) else {
            bail!("cell {cell} should have one column letter");
        };
        let col = self
            .columns
            .chars()
            .position(|c| c == letter)
            .with_context(|| format!("no column {letter} on map {}", self.id))?;
        let row: u32 = row
            .parse()
            .with_context(|| format!("bad row in cell {cell}"))?;
        if row == 0 || row > self.rows {
            bail!("no row {row} on map {}", self.id);
        }
        let width = (max_x - min_x) / self.columns.chars().count() as f64;
        let height = (max_y - min_y) / f64::from(self.rows);
        let west = min_x + col as f64 * width;
        let north = max_y - f64::from(row - 1) * height;
        Ok(Bounds::new(west, north - height, west + width, north))
    }
}

/// Map sheet extents, keyed by sheet id.
#[derive(Debug, Clone, Default)]
pub(crate) struct GridTable {
    sheets: BTreeMap<String, MapSheet>,
}

impl GridTable {
    pub(crate) fn load(path: &Path) -> Result<GridTable> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("unable to read grid table {}", path.display()))?;
        let sheets: Vec<MapSheet> = serde_json::from_str(&text)
            .with_context(|| format!("invalid grid table {}", path.display()))?;
        Ok(GridTable::from_sheets(sheets))
    }

    pub(crate) fn from_sheets(sheets: impl IntoIterator<Item = MapSheet>) -> GridTable {
        GridTable {
            sheets: sheets.into_iter().map(|s| (s.id.clone(), s)).collect(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.sheets.len()
    }

    pub(crate) fn cell_bounds(&self, sheet: &str, cell: Option<&str>) -> Result<Bounds> {
        let map = self
            .sheets
            .get(sheet)
            .with_context(|| format!("unknown map sheet {sheet}"))?;
        match cell {
            Some(cell) => map.cell_bounds(cell),
            None => {
                let [min_x, min_y, max_x, max_y] = map.bounds;
                Ok(Bounds::new(min_x, min_y, max_x, max_y))
            }
        }
    }
}

/// The representative geometry of a place.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Resolution {
    Point(Point),
    Grids(Vec<GridCell>),
    None,
}

/// The geometry of a single location.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum LocationGeometry {
    Grids(Vec<GridCell>),
    Shape(Shape),
    None,
}

pub(crate) struct GeometryResolver<'a> {
    grid_base: &'a str,
    grids: &'a GridTable,
}

impl<'a> GeometryResolver<'a> {
    pub(crate) fn new(grid_base: &'a str, grids: &'a GridTable) -> GeometryResolver<'a> {
        GeometryResolver { grid_base, grids }
    }

    pub(crate) fn resolve(&self, precision: Option<Precision>, locations: &[Location]) -> Resolution {
        match precision {
            Some(Precision::Precise) => self
                .representative_point(locations)
                .map_or(Resolution::None, Resolution::Point),
            Some(Precision::Rough) => {
                let cells = self.place_grid_cells(locations);
                if cells.is_empty() {
                    Resolution::None
                } else {
                    Resolution::Grids(cells)
                }
            }
            None => Resolution::None,
        }
    }

    /// Centroid of the first shape that has one, else the middle of the
    /// bounds of everything.
    fn representative_point(&self, locations: &[Location]) -> Option<Point> {
        let mut bounds: Option<Bounds> = None;
        let mut point: Option<Coord> = None;
        for location in locations {
            let Some(geometry) = &location.geometry else {
                continue;
            };
            let footprint = match Footprint::from_geojson(geometry) {
                Ok(footprint) => footprint,
                Err(error) => {
                    warn!(target: "geometry", path = %location.meta.path, %error, "unreadable geometry");
                    continue;
                }
            };
            bounds = Some(bounds.map_or(footprint.bounds, |b| b.union(footprint.bounds)));
            if point.is_none() {
                point = footprint.centroid();
            }
        }
        point.or_else(|| bounds.map(|b| b.center())).map(Point::from)
    }

    fn place_grid_cells(&self, locations: &[Location]) -> Vec<GridCell> {
        let mut cells = Vec::new();
        for location in locations {
            match GridRef::parse(self.grid_base, &location.location, GridScope::Place) {
                Ok(Some(grid)) => cells.extend(self.cells(&location.meta.path, &grid)),
                Ok(None) => {}
                Err(error) => {
                    warn!(target: "geometry", path = %location.meta.path, %error, "malformed grid reference");
                }
            }
        }
        cells
    }

    /// Grid cells of one parsed reference; unknown cells are logged and left out.
    pub(crate) fn cells(&self, path: &str, grid: &GridRef) -> Vec<GridCell> {
        grid.cells
            .iter()
            .filter_map(|cell| match self.cell(&grid.sheet, cell.as_deref()) {
                Ok(cell) => Some(cell),
                Err(error) => {
                    warn!(target: "geometry", path, sheet = %grid.sheet, %error, "unknown grid cell");
                    None
                }
            })
            .collect()
    }

    fn cell(&self, sheet: &str, cell: Option<&str>) -> Result<GridCell> {
        let bounds = self.grids.cell_bounds(sheet, cell)?;
        let uri = build_uri(&format!("{}{}", self.grid_base, sheet))?.with_fragment(cell.unwrap_or("this"));
        let extent = uri.join("-extent");
        debug!(target: "geometry", %uri, "grid cell");
        Ok(GridCell {
            uri,
            extent,
            bounds,
        })
    }

    pub(crate) fn location_geometry(&self, location: &Location) -> Result<LocationGeometry> {
        if let Some(grid) = GridRef::parse(self.grid_base, &location.location, GridScope::Location)? {
            return Ok(LocationGeometry::Grids(self.cells(&location.meta.path, &grid)));
        }
        match &location.geometry {
            Some(geometry) if geometry.get("type").is_some() => {
                Ok(LocationGeometry::Shape(Shape::from_geojson(geometry)?))
            }
            _ => Ok(LocationGeometry::None),
        }
    }
}
